//! Configuration for the IdeaNet gateway
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// IdeaNet gateway - accountability contract backend
///
/// Proxies idea/goal storage to a PostgREST-compatible store, step and
/// similarity synthesis to a generative AI API, and settles stake
/// transfers between accountability partners.
#[derive(Parser, Debug, Clone)]
#[command(name = "ideanet-gateway")]
#[command(about = "HTTP gateway for the IdeaNet accountability contract demo")]
pub struct Args {
    /// Unique node identifier for this gateway instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Supabase project URL (e.g. "https://xyz.supabase.co")
    /// When unset in dev mode, idea nodes are kept in memory
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase service/anon API key
    #[arg(long, env = "SUPABASE_KEY")]
    pub supabase_key: Option<String>,

    /// Gemini API key for step synthesis and similarity scoring
    /// When unset in dev mode, synthesis is disabled and similarity
    /// always uses the local estimator
    #[arg(long, env = "GEMINI_API_KEY")]
    pub gemini_api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.5-flash")]
    pub gemini_model: String,

    /// Gemini API base URL (override for testing/self-hosted proxies)
    #[arg(
        long,
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com"
    )]
    pub gemini_base_url: String,

    /// Enable development mode (external collaborators become optional)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Outbound request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Starting balance for newly created demo accounts
    #[arg(long, env = "STARTING_BALANCE", default_value = "500")]
    pub starting_balance: f64,

    /// Stake applied when neither the request nor a contract supplies one
    #[arg(long, env = "DEFAULT_STAKE", default_value = "100")]
    pub default_stake: f64,
}

impl Args {
    /// Whether both Supabase settings are present
    pub fn supabase_configured(&self) -> bool {
        matches!(
            (&self.supabase_url, &self.supabase_key),
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty()
        )
    }

    /// Whether the Gemini API key is present
    pub fn gemini_configured(&self) -> bool {
        self.gemini_api_key
            .as_deref()
            .is_some_and(|k| !k.is_empty())
    }

    /// Outbound request timeout
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if !self.supabase_configured() {
                return Err("SUPABASE_URL and SUPABASE_KEY are required in production mode".to_string());
            }
            if !self.gemini_configured() {
                return Err("GEMINI_API_KEY is required in production mode".to_string());
            }
        }

        if !self.starting_balance.is_finite() || self.starting_balance < 0.0 {
            return Err("STARTING_BALANCE must be a non-negative number".to_string());
        }
        if !self.default_stake.is_finite() || self.default_stake < 0.0 {
            return Err("DEFAULT_STAKE must be a non-negative number".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["ideanet-gateway"])
    }

    #[test]
    fn production_requires_collaborators() {
        let args = base_args();
        assert!(args.validate().is_err());

        let mut args = base_args();
        args.supabase_url = Some("https://xyz.supabase.co".into());
        args.supabase_key = Some("key".into());
        assert!(args.validate().is_err());

        args.gemini_api_key = Some("key".into());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn dev_mode_runs_bare() {
        let mut args = base_args();
        args.dev_mode = true;
        assert!(args.validate().is_ok());
        assert!(!args.supabase_configured());
        assert!(!args.gemini_configured());
    }

    #[test]
    fn negative_starting_balance_rejected() {
        let mut args = base_args();
        args.dev_mode = true;
        args.starting_balance = -1.0;
        assert!(args.validate().is_err());
    }

    #[test]
    fn negative_default_stake_rejected() {
        let mut args = base_args();
        args.dev_mode = true;
        args.default_stake = -10.0;
        assert!(args.validate().is_err());
    }

    #[test]
    fn empty_strings_do_not_count_as_configured() {
        let mut args = base_args();
        args.supabase_url = Some(String::new());
        args.supabase_key = Some("key".into());
        assert!(!args.supabase_configured());
    }
}
