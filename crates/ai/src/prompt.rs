//! Instruction payloads sent to the intelligence provider.
//!
//! One variant is chosen per process; it decides both the prompt and whether
//! the contract address is part of the outgoing message.

use core::str::FromStr;

use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ScanVariant {
    /// Launches from the last 48 hours, no contract address.
    #[default]
    Standard,
    /// Launches from the last 30 minutes, with contract address and market cap.
    Contract,
}

#[derive(Debug, Clone, Error)]
#[error("unknown scan variant '{0}' (expected 'standard' or 'contract')")]
pub struct UnknownVariant(pub String);

impl ScanVariant {
    pub fn payload(&self) -> &'static str {
        match self {
            ScanVariant::Standard => STANDARD_PROMPT,
            ScanVariant::Contract => CONTRACT_PROMPT,
        }
    }

    pub fn includes_contract_address(&self) -> bool {
        matches!(self, ScanVariant::Contract)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanVariant::Standard => "standard",
            ScanVariant::Contract => "contract",
        }
    }
}

impl FromStr for ScanVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(ScanVariant::Standard),
            "contract" => Ok(ScanVariant::Contract),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

const STANDARD_PROMPT: &str = r#"You are a specialized crypto intelligence agent with real-time access to web trends, especially from:
- Twitter (Crypto Twitter influencers and threads)
- Alpha Telegram groups
- DEX launchpads (e.g., Pump.fun, DEXTools, Uniswap listings)

Identify and report on up to 3 newly launched meme coins (called "tinkers") that show high potential for virality, based on community hype and early market signals.

Each coin must:
- Be recently launched (preferably within the last 48 hours)
- Show clear signs of hype from credible sources (influencers, Telegram, early whales)
- Display early viral momentum (trending, active discussion, notable buys)

For each tinker, return a JSON object containing:
- "name": UPPERCASE name of the token
- "reason": a brief explanation of why it is gaining traction
- "hypeLevel": one of "High", "Medium", or "Low"
- "riskLevel": one of "High", "Medium", or "Low" (volatility, anon devs, locked liquidity, etc.)
- "source": where it was discovered (e.g., Twitter, Telegram, DEXTools)
- "blockchain": the chain the token is on (e.g., Ethereum, BSC, Solana, Base)
- "foundAt": ISO 8601 timestamp of first discovery
- "createdAt": ISO 8601 timestamp of this report

Output format:
- Return a valid JSON array of 0 to 3 objects
- Do not include any introductory or extra text; return the raw JSON only
- Do not use markdown or code block formatting

Example:
[
  {
    "name": "MEMEX",
    "reason": "Launched today on Base. Mentioned by Pauly. Trending in CT.",
    "hypeLevel": "High",
    "riskLevel": "Medium",
    "source": "Twitter",
    "blockchain": "Base",
    "foundAt": "2025-06-29T12:00:00Z",
    "createdAt": "2025-06-29T12:05:00Z"
  }
]"#;

const CONTRACT_PROMPT: &str = r#"You are an aggressive on-chain scout watching DEX launchpads (Pump.fun, DEXTools, Uniswap, Raydium), alpha Telegram groups and Crypto Twitter.

Report up to 5 meme coins (called "tinkers") launched within the last 30 minutes that already show unusual buy pressure or social traction.

For each tinker, return a JSON object containing:
- "name": UPPERCASE ticker of the token
- "reason": one sentence on why it is moving
- "hypeLevel": one of "High", "Medium", or "Low"
- "riskLevel": one of "High", "Medium", or "Low"
- "source": where it was spotted
- "blockchain": the chain the token is on
- "contractAddress": the token contract address
- "marketCap": approximate market cap in USD, as a number
- "foundAt": ISO 8601 timestamp of first discovery
- "createdAt": ISO 8601 timestamp of this report

Return only a raw JSON array of 0 to 5 objects, with no markdown and no extra text."#;
