//! wsman - WS-Management command-line client
//!
//! Exit status is 0 for a regular response, 2 when the agent answered with a
//! SOAP fault and 1 on any other error.

mod cli;

use anyhow::{Context, Result};
use cli::output::OutputFormatter;
use cli::{Cli, Commands, EnumerateArgs};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wsman::config::ClientConfig;
use wsman::enumeration;
use wsman::{ActionOptions, WsManClient, WsManOperations, XmlDoc};

const EXIT_OK: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_FAULT: i32 = 2;

const DUMP_DIRECTIVE: &str = "wsman::dump=info";

fn main() {
    let cli = Cli::parse_args();
    init_logging(cli.verbosity(), cli.command.request().dump);

    let out = OutputFormatter::new(!cli.no_color);
    let code = match run(&cli, &out) {
        Ok(code) => code,
        Err(e) => {
            out.error(&format!("{:#}", e));
            EXIT_ERROR
        }
    };
    std::process::exit(code);
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8, dump: bool) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(verbosity >= 3).with_writer(std::io::stderr))
        .with(log_filter(verbosity, dump))
        .init();
}

/// Level filter for `verbosity`; `--dump` always lets envelope dumps through.
fn log_filter(verbosity: u8, dump: bool) -> EnvFilter {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let mut env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    if dump {
        if let Ok(directive) = DUMP_DIRECTIVE.parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }
    env_filter
}

fn run(cli: &Cli, out: &OutputFormatter) -> Result<i32> {
    let mut config = ClientConfig::load(cli.config.as_ref())?;
    cli.apply_to(&mut config);

    let mut client = config.connect()?;
    debug!(endpoint = client.endpoint(), "Connected");

    let request = cli.command.request();
    let mut options = request.to_options(config.action_options());
    let xpath = request.xpath.as_deref();

    let response = match &cli.command {
        Commands::Identify(_) => client.identify(&options).context("Identify failed")?,
        Commands::Get(args) => client
            .get(&args.resource_uri, &options)
            .context("Get failed")?,
        Commands::Put(args) => client
            .put(&args.resource_uri, &options)
            .context("Put failed")?,
        Commands::Create(args) => client
            .create(&args.resource_uri, &options)
            .context("Create failed")?,
        Commands::Invoke(args) => client
            .invoke(&args.resource_uri, &args.method, &options)
            .context("Invoke failed")?,
        Commands::Enumerate(args) => {
            options.flags |= args.flags();
            let code = run_enumerate(&mut client, args, &options, xpath, out)?;
            client.close();
            return Ok(code);
        }
    };

    client.close();
    Ok(report(&response, xpath, out))
}

/// Print a response and map it to an exit code.
fn report(doc: &XmlDoc, xpath: Option<&str>, out: &OutputFormatter) -> i32 {
    out.document(doc, xpath);
    if doc.is_fault() {
        out.fault(doc);
        EXIT_FAULT
    } else {
        EXIT_OK
    }
}

fn run_enumerate(
    client: &mut WsManClient,
    args: &EnumerateArgs,
    options: &ActionOptions,
    xpath: Option<&str>,
    out: &OutputFormatter,
) -> Result<i32> {
    if args.items {
        let items = client
            .enumerate_all(&args.resource_uri, args.max_elements, options)
            .context("Enumeration failed")?;
        for item in items {
            out.document(&XmlDoc::from_root(item), xpath);
        }
        return Ok(EXIT_OK);
    }

    let response = client
        .enumerate(&args.resource_uri, args.max_elements, options)
        .context("Enumerate failed")?;
    let code = report(&response, xpath, out);
    if code != EXIT_OK || enumeration::is_end_of_sequence(&response) {
        return Ok(code);
    }

    let mut context = enumeration::extract_context(&response);
    while let Some(current) = context.take() {
        let response =
            match client.pull(&args.resource_uri, Some(current.clone()), args.max_elements, options)
            {
                Ok(response) => response,
                Err(e) => {
                    if let Err(release_err) =
                        client.release(&args.resource_uri, Some(current), options)
                    {
                        debug!(error = %release_err, "Release after failed Pull");
                    }
                    return Err(anyhow::Error::new(e).context("Pull failed"));
                }
            };
        let code = report(&response, xpath, out);
        if code != EXIT_OK || enumeration::is_end_of_sequence(&response) {
            return Ok(code);
        }
        context = enumeration::extract_context(&response);
    }
    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::sync::{Arc, Mutex};
    use wsman::transport::{Transport, TransportRequest};
    use wsman::{Error, WsContext};

    const FAN_URI: &str = "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_Fan";

    /// Answers the first exchange with `first` and fails every later one.
    #[derive(Clone, Default)]
    struct FailAfterFirst {
        first: String,
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl Transport for FailAfterFirst {
        fn exchange(&mut self, request: &TransportRequest<'_>) -> wsman::Result<Option<String>> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(request.body.to_string());
            if sent.len() == 1 {
                Ok(Some(self.first.clone()))
            } else {
                Err(Error::Http {
                    endpoint: request.endpoint.to_string(),
                    message: "connection reset".to_string(),
                })
            }
        }
    }

    fn enumerate_response(context: &str) -> String {
        format!(
            r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"
    xmlns:wsen="http://schemas.xmlsoap.org/ws/2004/09/enumeration">
  <s:Header/>
  <s:Body><wsen:EnumerateResponse><wsen:EnumerationContext>{context}</wsen:EnumerationContext></wsen:EnumerateResponse></s:Body>
</s:Envelope>"#
        )
    }

    #[test]
    fn test_failed_pull_releases_context() {
        let transport = FailAfterFirst {
            first: enumerate_response("ctx-1"),
            ..Default::default()
        };
        let sent = transport.sent.clone();
        let mut client = WsManClient::connect(WsContext::new(), None, 0, None, None, None, None)
            .unwrap()
            .with_transport(Box::new(transport));

        let cli = Cli::try_parse_from(["wsman", "enumerate", FAN_URI]).unwrap();
        let Commands::Enumerate(args) = &cli.command else {
            panic!("expected enumerate");
        };
        let out = OutputFormatter::new(false);

        let err = run_enumerate(&mut client, args, &ActionOptions::new(), None, &out).unwrap_err();
        assert!(err.to_string().contains("Pull failed"));

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        assert!(sent[1].contains("enumeration/Pull"));
        assert!(sent[2].contains("enumeration/Release"));
        assert!(sent[2].contains("ctx-1"));
    }

    #[test]
    fn test_dump_directive_added_only_with_dump() {
        std::env::remove_var("RUST_LOG");
        assert!(log_filter(0, true).to_string().contains(DUMP_DIRECTIVE));
        assert!(!log_filter(0, false).to_string().contains(DUMP_DIRECTIVE));
    }
}
