use std::env;
use std::time::Duration;

use bringup_node::sim::{SimBehavior, SimConfig, DEFAULT_USER_ID};

pub const DEFAULT_NODE_NAME: &str = "carrier_node";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_BRINGUP_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub node_name: String,
    pub timeout: Duration,
    pub bringup_delay: Duration,
    pub behavior: SimBehavior,
    pub user_id: String,
    pub print_graph: bool,
}

impl ProbeConfig {
    pub fn from_args() -> Self {
        Self::from_args_iter(env::args())
    }

    /// Env provides defaults, flags override them. The first item is the program name.
    pub fn from_args_iter<I, S>(iter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut node_name =
            env::var("BRINGUP_PROBE_NODE_NAME").unwrap_or_else(|_| DEFAULT_NODE_NAME.to_string());
        let mut timeout = env::var("BRINGUP_PROBE_TIMEOUT_MS")
            .ok()
            .and_then(|v| parse_millis(&v))
            .unwrap_or(DEFAULT_TIMEOUT);
        let mut bringup_delay = env::var("BRINGUP_PROBE_DELAY_MS")
            .ok()
            .and_then(|v| parse_millis(&v))
            .unwrap_or(DEFAULT_BRINGUP_DELAY);
        let mut user_id =
            env::var("BRINGUP_PROBE_USER_ID").unwrap_or_else(|_| DEFAULT_USER_ID.to_string());
        let mut behavior = match env::var("BRINGUP_PROBE_FAIL") {
            Ok(cause) if !cause.is_empty() => SimBehavior::Fail(cause),
            _ => SimBehavior::Ready,
        };
        if env::var("BRINGUP_PROBE_NEVER_READY")
            .ok()
            .and_then(parse_bool)
            .unwrap_or(false)
        {
            behavior = SimBehavior::Never;
        }
        let mut print_graph = false;

        let mut args = iter.into_iter();
        let _ = args.next();
        while let Some(arg) = args.next() {
            let arg = arg.as_ref();
            match arg {
                "-h" | "--help" => {
                    print_usage();
                    std::process::exit(0);
                }
                "--node-name" => {
                    if let Some(value) = args.next() {
                        node_name = value.as_ref().to_string();
                    }
                }
                "--timeout-ms" => {
                    if let Some(value) = args.next().and_then(|v| parse_millis(v.as_ref())) {
                        timeout = value;
                    }
                }
                "--delay-ms" => {
                    if let Some(value) = args.next().and_then(|v| parse_millis(v.as_ref())) {
                        bringup_delay = value;
                    }
                }
                "--fail" => {
                    if let Some(value) = args.next() {
                        behavior = SimBehavior::Fail(value.as_ref().to_string());
                    }
                }
                "--user-id" => {
                    if let Some(value) = args.next() {
                        user_id = value.as_ref().to_string();
                    }
                }
                "--never-ready" => {
                    behavior = SimBehavior::Never;
                }
                "--print-graph" => {
                    print_graph = true;
                }
                _ if arg.starts_with("--node-name=") => {
                    node_name = arg["--node-name=".len()..].to_string();
                }
                _ if arg.starts_with("--timeout-ms=") => {
                    if let Some(value) = parse_millis(&arg["--timeout-ms=".len()..]) {
                        timeout = value;
                    }
                }
                _ if arg.starts_with("--delay-ms=") => {
                    if let Some(value) = parse_millis(&arg["--delay-ms=".len()..]) {
                        bringup_delay = value;
                    }
                }
                _ if arg.starts_with("--fail=") => {
                    behavior = SimBehavior::Fail(arg["--fail=".len()..].to_string());
                }
                _ if arg.starts_with("--user-id=") => {
                    user_id = arg["--user-id=".len()..].to_string();
                }
                _ => {
                    tracing::warn!(arg, "ignoring unknown argument");
                }
            }
        }

        Self {
            node_name,
            timeout,
            bringup_delay,
            behavior,
            user_id,
            print_graph,
        }
    }

    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            bringup_delay: self.bringup_delay,
            behavior: self.behavior.clone(),
            user_id: self.user_id.clone(),
        }
    }
}

fn print_usage() {
    println!(
        "bringup_probe [--node-name <name>] [--timeout-ms <ms>] [--delay-ms <ms>] [--fail <cause> | --never-ready] [--user-id <id>] [--print-graph]"
    );
}

pub fn parse_bool(value: String) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn parse_millis(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_millis)
}
