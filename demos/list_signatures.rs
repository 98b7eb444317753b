//! Example: List certifications on a key's user IDs
//!
//! Run with: cargo run --example list_signatures -- <KEYID> [--known-only]

use gnupg_keys::{EngineConfig, IdentityKind, Keyring, SignatureReport};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> gnupg_keys::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(keyid) = args.next() else {
        eprintln!("usage: list_signatures <KEYID> [--known-only]");
        std::process::exit(2);
    };
    let known_only = args.any(|a| a == "--known-only");

    let config = EngineConfig::detect("gpg").await?;
    println!("Using gpg {}\n", config.version());

    let keyring = Keyring::new(config);
    let report = keyring.get_key_signatures(&keyid, known_only).await?;
    print!("{}", format_report(&report));

    Ok(())
}

fn format_report(report: &SignatureReport) -> String {
    let mut out = String::new();
    for identity in report {
        let marker = match identity.kind {
            IdentityKind::UserId => "uid",
            IdentityKind::Attribute => "uat",
        };
        out.push_str(&format!("{} {}\n", marker, identity.uid));

        for sig in &identity.signatures {
            let created = sig
                .created
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "    {} {} {} {}\n",
                sig.sig_class, sig.signer_keyid, created, sig.signer_uid
            ));
        }
    }
    out
}
