//! # Address and Path Helpers
//!
//! Listen-address parsing, peer address formatting and home directory
//! expansion.

use std::env::VarError;
use std::path::PathBuf;

use crate::domain::{HomeExpansionError, DEFAULT_P2P_PORT};

/// Extract the port of a listen address such as `tcp://0.0.0.0:26656`.
///
/// Anything unparsable yields [`DEFAULT_P2P_PORT`].
pub fn parse_p2p_port(laddr: &str) -> u16 {
    let without_scheme = laddr
        .split_once("://")
        .map_or(laddr, |(_, rest)| rest)
        .trim_end_matches('/');
    without_scheme
        .rsplit_once(':')
        .and_then(|(_, port)| port.parse::<u16>().ok())
        .filter(|port| *port != 0)
        .unwrap_or(DEFAULT_P2P_PORT)
}

/// `node_id@ip:port`, the form expected by `p2p.persistent_peers`.
pub fn format_peer_address(node_id: &str, ip: &str, port: u16) -> String {
    format!("{}@{}:{}", node_id.trim(), ip, port)
}

/// Expand a leading `~` to the current user's home, then expand `$VAR` and
/// `${VAR}` references.
///
/// Fails when the path needs a home directory that cannot be resolved or
/// references an unset variable.
pub fn expand_home(path: &str) -> Result<String, HomeExpansionError> {
    expand_home_with(path, dirs::home_dir(), |name| std::env::var(name).ok())
}

/// [`expand_home`] with an injectable home directory and variable lookup.
pub fn expand_home_with<F>(
    path: &str,
    home: Option<PathBuf>,
    lookup: F,
) -> Result<String, HomeExpansionError>
where
    F: Fn(&str) -> Option<String>,
{
    let wants_home = path == "~" || path.starts_with("~/");
    let home = match home {
        Some(home) => Some(home.to_string_lossy().into_owned()),
        None if wants_home => return Err(HomeExpansionError::NoHomeDirectory),
        None => None,
    };

    shellexpand::full_with_context(
        path,
        || home,
        |name| lookup(name).map(Some).ok_or(VarError::NotPresent),
    )
    .map(|expanded| expanded.into_owned())
    .map_err(|e| HomeExpansionError::UnsetVariable { name: e.var_name })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> Option<String> {
        match name {
            "HOME" => Some("/home/val".into()),
            "NET" => Some("local".into()),
            _ => None,
        }
    }

    #[test]
    fn test_parse_p2p_port() {
        assert_eq!(parse_p2p_port("tcp://0.0.0.0:26656"), 26656);
        assert_eq!(parse_p2p_port("tcp://127.0.0.1:36656"), 36656);
        assert_eq!(parse_p2p_port("0.0.0.0:1234"), 1234);
    }

    #[test]
    fn test_parse_p2p_port_falls_back_to_default() {
        assert_eq!(parse_p2p_port(""), DEFAULT_P2P_PORT);
        assert_eq!(parse_p2p_port("tcp://0.0.0.0"), DEFAULT_P2P_PORT);
        assert_eq!(parse_p2p_port("tcp://0.0.0.0:port"), DEFAULT_P2P_PORT);
        assert_eq!(parse_p2p_port("tcp://0.0.0.0:99999"), DEFAULT_P2P_PORT);
    }

    #[test]
    fn test_format_peer_address() {
        assert_eq!(
            format_peer_address("abc123\n", "10.0.0.2", 26656),
            "abc123@10.0.0.2:26656"
        );
    }

    fn home() -> Option<PathBuf> {
        Some(PathBuf::from("/home/val"))
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home_with("~/.simd", home(), env).unwrap(), "/home/val/.simd");
        assert_eq!(expand_home_with("~", home(), env).unwrap(), "/home/val");
        assert_eq!(
            expand_home_with("~/$NET/${NET}x", home(), env).unwrap(),
            "/home/val/local/localx"
        );
        assert_eq!(expand_home_with("/data/$NET", home(), env).unwrap(), "/data/local");
    }

    #[test]
    fn test_only_leading_tilde_is_expanded() {
        assert_eq!(
            expand_home_with("~/net/a~b", home(), env).unwrap(),
            "/home/val/net/a~b"
        );
        assert_eq!(expand_home_with("/data/a~b", home(), env).unwrap(), "/data/a~b");
    }

    #[test]
    fn test_unresolved_home_is_an_error() {
        assert_eq!(
            expand_home_with("~/node0", None, env),
            Err(HomeExpansionError::NoHomeDirectory)
        );
        // no home needed
        assert_eq!(expand_home_with("/srv/node0", None, env).unwrap(), "/srv/node0");
    }

    #[test]
    fn test_unset_variable_is_an_error() {
        assert_eq!(
            expand_home_with("~/$MISSING/a", home(), env),
            Err(HomeExpansionError::UnsetVariable {
                name: "MISSING".into()
            })
        );
    }
}
