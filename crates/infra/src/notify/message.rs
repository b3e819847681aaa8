use tinkerscout_core::Tinker;

/// Sent once per recipient when a cycle accepted no new tinkers.
pub const NO_NEW_TINKERS_NOTICE: &str = "🤖 No new tinkers found in this run.";

/// Per-tinker broadcast text.
///
/// Plain text (no parse mode): names and reasons come from an untrusted
/// source and would otherwise need Markdown escaping.
pub fn format_tinker_message(tinker: &Tinker, include_contract_address: bool) -> String {
    let mut msg = format!(
        "🚀 {}\n🧠 {}\n🔥 Hype: {}\n⚠️ Risk: {}\n🌐 Source: {}\n🧬 Chain: {}",
        tinker.name,
        tinker.reason,
        tinker.hype_level,
        tinker.risk_level,
        tinker.source,
        tinker.blockchain,
    );
    if include_contract_address {
        msg.push_str("\n🧾 CA: ");
        msg.push_str(&tinker.contract_address);
    }
    msg
}
