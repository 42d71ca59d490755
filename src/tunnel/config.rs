//! Rendering of a WireGuard `wg-quick`-style configuration.
//!
//! The private key never appears in the profile file itself; it is fetched
//! from the secret store and passed in at render time.

use std::fmt::Write;
use std::path::Path;

use serde::Deserialize;

use crate::errors::{Result, WgKeyError};

/// Keepalive interval written for every peer, in seconds.
const PERSISTENT_KEEPALIVE: u32 = 5;

/// A tunnel profile as stored by the owning application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub profile_name: String,

    #[serde(default)]
    pub interface_name: String,

    #[serde(default)]
    pub peers: Vec<Peer>,
}

/// One `[Peer]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Peer {
    #[serde(default)]
    pub name: String,

    /// The peer's public key.
    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub allowed_prefixes: String,

    #[serde(default)]
    pub endpoint: String,

    #[serde(default, alias = "presharedKey")]
    pub preshared_key: String,
}

impl Profile {
    /// Read a profile from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        serde_json::from_slice(&data).map_err(|e| {
            WgKeyError::Serialization(format!("profile {}: {e}", path.display()))
        })
    }
}

/// Build the configuration text for `profile` using `private_key`.
///
/// Output is trimmed and ends with exactly one newline.
pub fn render(profile: &Profile, private_key: &str) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "[Interface]");
    let _ = writeln!(out, "#Profile = {}", profile.profile_name);
    let _ = writeln!(out, "PrivateKey = {private_key}");
    out.push('\n');

    for peer in &profile.peers {
        let _ = writeln!(out, "[Peer]");
        let name = peer.name.trim();
        if !name.is_empty() {
            let _ = writeln!(out, "#Name = {name}");
        }
        let _ = writeln!(out, "PublicKey = {}", peer.key.trim());
        let _ = writeln!(out, "AllowedIPs = {}", peer.allowed_prefixes.trim());
        let _ = writeln!(out, "Endpoint = {}", peer.endpoint.trim());
        let psk = peer.preshared_key.trim();
        if !psk.is_empty() {
            let _ = writeln!(out, "PresharedKey = {psk}");
        }
        let _ = writeln!(out, "PersistentKeepalive = {PERSISTENT_KEEPALIVE}");
        out.push('\n');
    }

    let mut text = out.trim().to_string();
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Profile {
        serde_json::from_str(
            r#"{
                "profile_name": "test",
                "interface_name": "wg0",
                "peers": [{
                    "name": "peer1",
                    "key": "pubkey",
                    "allowed_prefixes": "0.0.0.0/0",
                    "endpoint": "vpn.example.com:51820",
                    "presharedKey": ""
                }]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn includes_private_and_public_keys() {
        let text = render(&sample(), "privkey");
        assert!(text.contains("PrivateKey = privkey"));
        assert!(text.contains("PublicKey = pubkey"));
        assert!(text.contains("#Name = peer1"));
        assert!(text.contains("PersistentKeepalive = 5"));
        assert!(!text.contains("PresharedKey"));
    }

    #[test]
    fn exact_layout() {
        let mut profile = sample();
        profile.peers[0].preshared_key = " psk ".to_string();
        profile.peers.push(Peer {
            key: "second".to_string(),
            allowed_prefixes: "10.0.0.0/8".to_string(),
            endpoint: "b.example:51820".to_string(),
            ..Peer::default()
        });

        let expected = "\
[Interface]
#Profile = test
PrivateKey = privkey

[Peer]
#Name = peer1
PublicKey = pubkey
AllowedIPs = 0.0.0.0/0
Endpoint = vpn.example.com:51820
PresharedKey = psk
PersistentKeepalive = 5

[Peer]
PublicKey = second
AllowedIPs = 10.0.0.0/8
Endpoint = b.example:51820
PersistentKeepalive = 5
";
        assert_eq!(render(&profile, "privkey"), expected);
    }

    #[test]
    fn profile_without_peers() {
        let profile = Profile {
            profile_name: "solo".to_string(),
            ..Profile::default()
        };
        assert_eq!(
            render(&profile, "k"),
            "[Interface]\n#Profile = solo\nPrivateKey = k\n"
        );
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let profile: Profile = serde_json::from_str(r#"{"peers":[{}]}"#).unwrap();
        let text = render(&profile, "k");
        assert!(text.contains("PublicKey = \n"));
        assert!(text.starts_with("[Interface]\n#Profile = \n"));
    }
}
