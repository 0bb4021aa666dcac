//! Actor resolution for admin commands.
//!
//! Every lifecycle operation records who performed it. Rather than requiring
//! `--as` on every invocation, the actor is resolved through a chain:
//!
//! 1. `--as <actor>`: explicit per-command override
//! 2. `CONCERNS_ACTOR` env var: process/session level
//! 3. `default-actor` in `~/.concerns/config.toml`
//!
//! The resolved name is passed explicitly into every operation; nothing
//! below the CLI reads it from the environment.

use std::env;

use crate::config::Config;

/// Error message shown when the actor cannot be resolved.
pub const ACTOR_REQUIRED: &str = "actor required: pass --as <name>, \
    set CONCERNS_ACTOR, or add `default-actor = \"...\"` to ~/.concerns/config.toml";

const ACTOR_ENV: &str = "CONCERNS_ACTOR";

/// Resolve the acting admin from the tiered resolution chain.
pub fn resolve_actor(explicit: Option<&str>, config: &Config) -> Result<String, String> {
    resolve_from(explicit, env::var(ACTOR_ENV).ok().as_deref(), config)
}

fn resolve_from(
    explicit: Option<&str>,
    from_env: Option<&str>,
    config: &Config,
) -> Result<String, String> {
    [explicit, from_env, config.default_actor.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| ACTOR_REQUIRED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(actor: Option<&str>) -> Config {
        Config {
            default_actor: actor.map(String::from),
            ..Config::default()
        }
    }

    #[test]
    fn explicit_wins() {
        let result = resolve_from(Some("jdelacruz"), Some("env"), &config_with(Some("cfg")));
        assert_eq!(result.unwrap(), "jdelacruz");
    }

    #[test]
    fn env_beats_config() {
        let result = resolve_from(None, Some("mlim"), &config_with(Some("cfg")));
        assert_eq!(result.unwrap(), "mlim");
    }

    #[test]
    fn config_is_the_fallback() {
        let result = resolve_from(None, Some(""), &config_with(Some("cfg")));
        assert_eq!(result.unwrap(), "cfg");
    }

    #[test]
    fn nothing_configured_is_an_error() {
        let err = resolve_from(None, None, &config_with(None)).unwrap_err();
        assert_eq!(err, ACTOR_REQUIRED);
    }
}
