//! CLI module for the `wsman` command
//!
//! Argument parsing and the mapping from command-line flags onto
//! [`ClientConfig`] and [`ActionOptions`].

pub mod output;

use clap::{Args, Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use std::path::PathBuf;
use wsman::config::ClientConfig;
use wsman::{ActionFlags, ActionOptions};

/// wsman - WS-Management command-line client
#[derive(Parser, Debug, Clone)]
#[command(name = "wsman")]
#[command(version)]
#[command(about = "Send WS-Management requests to a CIM agent", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Agent host name
    #[arg(short = 'H', long, global = true)]
    pub hostname: Option<String>,

    /// Agent port (0 = scheme default)
    #[arg(short = 'P', long, global = true)]
    pub port: Option<u16>,

    /// Endpoint path
    #[arg(long, global = true)]
    pub path: Option<String>,

    /// URL scheme (http or https)
    #[arg(long, global = true)]
    pub scheme: Option<String>,

    /// User name for Basic authentication
    #[arg(short = 'u', long, global = true)]
    pub username: Option<String>,

    /// Password for Basic authentication
    #[arg(short = 'p', long, global = true, env = "WSMAN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Client certificate (PEM)
    #[arg(long, global = true)]
    pub cert: Option<PathBuf>,

    /// Client private key (PEM)
    #[arg(long, global = true)]
    pub key: Option<PathBuf>,

    /// Additional trusted CA certificate (PEM)
    #[arg(long, global = true)]
    pub cacert: Option<PathBuf>,

    /// Verify the server certificate
    #[arg(long, global = true, conflicts_with = "no_verify")]
    pub verify: bool,

    /// Do not verify the server certificate
    #[arg(long, global = true)]
    pub no_verify: bool,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Identify the agent
    Identify(RequestArgs),

    /// Get a resource instance
    Get(ResourceArgs),

    /// Update a resource instance from --properties
    Put(ResourceArgs),

    /// Create a resource instance from --properties
    Create(ResourceArgs),

    /// Invoke a custom method with --properties as input
    Invoke(InvokeArgs),

    /// Enumerate a collection
    Enumerate(EnumerateArgs),
}

/// Options shared by every request
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// Selectors as a query string (k=v&k2=v2)
    #[arg(short = 's', long)]
    pub selectors: Option<String>,

    /// Properties as a query string (k=v&k2=v2)
    #[arg(short = 'k', long)]
    pub properties: Option<String>,

    /// Enumeration filter
    #[arg(long)]
    pub filter: Option<String>,

    /// Filter dialect URI
    #[arg(long)]
    pub dialect: Option<String>,

    /// CIM namespace
    #[arg(long = "cim-namespace")]
    pub cim_namespace: Option<String>,

    /// Operation timeout in milliseconds
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,

    /// Log every request envelope
    #[arg(long)]
    pub dump: bool,

    /// Print the value selected by this XPath instead of the document
    #[arg(short = 'x', long)]
    pub xpath: Option<String>,
}

/// Arguments for get, put and create
#[derive(Args, Debug, Clone)]
pub struct ResourceArgs {
    /// Resource URI (may carry selectors as a query string)
    pub resource_uri: String,

    #[command(flatten)]
    pub request: RequestArgs,
}

/// Arguments for invoke
#[derive(Args, Debug, Clone)]
pub struct InvokeArgs {
    /// Resource URI
    pub resource_uri: String,

    /// Method name or full action URI
    pub method: String,

    #[command(flatten)]
    pub request: RequestArgs,
}

/// Polymorphism mode of an enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Polymorphism {
    /// IncludeSubClassProperties
    Include,
    /// ExcludeSubClassProperties
    Exclude,
    /// None
    None,
}

/// Arguments for enumerate
#[derive(Args, Debug, Clone)]
pub struct EnumerateArgs {
    /// Resource URI
    pub resource_uri: String,

    /// Maximum items per Pull (and per optimized Enumerate)
    #[arg(short = 'm', long, default_value = "0")]
    pub max_elements: u32,

    /// Request optimized enumeration
    #[arg(long)]
    pub optimize: bool,

    /// Enumerate endpoint references only
    #[arg(long)]
    pub epr: bool,

    /// Enumerate objects with their endpoint references
    #[arg(long = "obj-and-epr")]
    pub obj_and_epr: bool,

    /// Request a total item count estimate
    #[arg(long = "count-estimate")]
    pub count_estimate: bool,

    /// Polymorphism mode
    #[arg(long)]
    pub polymorphism: Option<Polymorphism>,

    /// Print the collected items instead of each response
    #[arg(long)]
    pub items: bool,

    #[command(flatten)]
    pub request: RequestArgs,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Overlay command-line connection flags on a loaded configuration.
    pub fn apply_to(&self, config: &mut ClientConfig) {
        if let Some(host) = &self.hostname {
            config.connection.host = Some(host.clone());
        }
        if let Some(port) = self.port {
            config.connection.port = port;
        }
        if let Some(path) = &self.path {
            config.connection.path = Some(path.clone());
        }
        if let Some(scheme) = &self.scheme {
            config.connection.scheme = Some(scheme.clone());
        }
        if let Some(user) = &self.username {
            config.auth.username = Some(user.clone());
        }
        if let Some(password) = &self.password {
            config.auth.password = Some(SecretString::new(password.clone().into_boxed_str()));
        }
        if let Some(cert) = &self.cert {
            config.tls.cert_file = Some(cert.clone());
        }
        if let Some(key) = &self.key {
            config.tls.key_file = Some(key.clone());
        }
        if let Some(ca) = &self.cacert {
            config.tls.ca_file = Some(ca.clone());
        }
        if self.verify {
            config.tls.verify_peer = true;
        } else if self.no_verify {
            config.tls.verify_peer = false;
        }
    }
}

impl Commands {
    /// Request options of the subcommand.
    pub fn request(&self) -> &RequestArgs {
        match self {
            Commands::Identify(args) => args,
            Commands::Get(args) | Commands::Put(args) | Commands::Create(args) => &args.request,
            Commands::Invoke(args) => &args.request,
            Commands::Enumerate(args) => &args.request,
        }
    }
}

impl RequestArgs {
    /// Build request options on top of the configured defaults.
    pub fn to_options(&self, defaults: ActionOptions) -> ActionOptions {
        let mut options = defaults;
        if let Some(selectors) = &self.selectors {
            options.selectors_from_query_string(selectors);
        }
        if let Some(properties) = &self.properties {
            options.properties_from_query_string(properties);
        }
        if let Some(filter) = &self.filter {
            options.filter = Some(filter.clone());
        }
        if let Some(dialect) = &self.dialect {
            options.dialect = Some(dialect.clone());
        }
        if let Some(ns) = &self.cim_namespace {
            options.cim_ns = Some(ns.clone());
        }
        if let Some(timeout) = self.timeout {
            options.timeout = timeout;
        }
        if self.dump {
            options.flags |= ActionFlags::DUMP_REQUEST;
        }
        options
    }
}

impl EnumerateArgs {
    /// Enumeration flags selected on the command line.
    pub fn flags(&self) -> ActionFlags {
        let mut flags = ActionFlags::empty();
        flags.set(ActionFlags::ENUMERATION_OPTIMIZATION, self.optimize);
        flags.set(ActionFlags::ENUMERATION_ENUM_EPR, self.epr);
        flags.set(ActionFlags::ENUMERATION_ENUM_OBJ_AND_EPR, self.obj_and_epr);
        flags.set(ActionFlags::ENUMERATION_COUNT_ESTIMATION, self.count_estimate);
        match self.polymorphism {
            Some(Polymorphism::Include) => flags |= ActionFlags::INCLUDE_SUBCLASS_PROPERTIES,
            Some(Polymorphism::Exclude) => flags |= ActionFlags::EXCLUDE_SUBCLASS_PROPERTIES,
            Some(Polymorphism::None) => flags |= ActionFlags::POLYMORPHISM_NONE,
            None => {}
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["wsman", "identify"]).unwrap();
        assert!(matches!(cli.command, Commands::Identify(_)));
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["wsman", "-vvvv", "identify"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_invoke_args_to_options() {
        let cli = Cli::try_parse_from([
            "wsman",
            "invoke",
            "http://schemas.omc-project.org/wbem/wscim/1/cim-schema/2/OMC_SystemTimeService",
            "ManageSystemTime",
            "--selectors",
            "CreationClassName=OMC_SystemTimeService&Name=timeservice",
            "--properties",
            "GetRequest=TRUE",
            "--dump",
            "-H",
            "server",
        ])
        .unwrap();
        let Commands::Invoke(args) = &cli.command else {
            panic!("expected invoke");
        };
        assert_eq!(args.method, "ManageSystemTime");

        let options = cli.command.request().to_options(ActionOptions::new());
        assert_eq!(options.selectors.as_ref().unwrap().len(), 2);
        assert_eq!(options.properties.as_ref().unwrap()["GetRequest"], "TRUE");
        assert!(options.flags.contains(ActionFlags::DUMP_REQUEST));

        let mut config = ClientConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config.connection.host.as_deref(), Some("server"));
    }

    #[test]
    fn test_enumerate_flags() {
        let cli = Cli::try_parse_from([
            "wsman",
            "enumerate",
            "http://x/CIM_Fan",
            "--optimize",
            "--epr",
            "--polymorphism",
            "exclude",
            "-m",
            "20",
        ])
        .unwrap();
        let Commands::Enumerate(args) = &cli.command else {
            panic!("expected enumerate");
        };
        assert_eq!(args.max_elements, 20);
        let flags = args.flags();
        assert!(flags.contains(ActionFlags::ENUMERATION_OPTIMIZATION));
        assert!(flags.contains(ActionFlags::ENUMERATION_ENUM_EPR));
        assert!(flags.contains(ActionFlags::EXCLUDE_SUBCLASS_PROPERTIES));
        assert!(!flags.contains(ActionFlags::ENUMERATION_COUNT_ESTIMATION));
    }

    #[test]
    fn test_verify_flags_override_config() {
        let mut config = ClientConfig::default();
        assert!(!config.tls.verify_peer);

        let cli = Cli::try_parse_from(["wsman", "--verify", "identify"]).unwrap();
        cli.apply_to(&mut config);
        assert!(config.tls.verify_peer);

        let cli = Cli::try_parse_from(["wsman", "identify", "--no-verify"]).unwrap();
        cli.apply_to(&mut config);
        assert!(!config.tls.verify_peer);

        let cli = Cli::try_parse_from(["wsman", "identify"]).unwrap();
        config.tls.verify_peer = true;
        cli.apply_to(&mut config);
        assert!(config.tls.verify_peer);
    }

    #[test]
    fn test_verify_conflicts_with_no_verify() {
        assert!(Cli::try_parse_from(["wsman", "--verify", "--no-verify", "identify"]).is_err());
    }
}
