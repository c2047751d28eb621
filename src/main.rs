use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use keyconsole::api::{HttpKeyService, KeyService};
use keyconsole::config::get_config;
use keyconsole::console::{Console, ConsoleCommand, Notifier, Tab, TerminalNotifier, Validity};
use keyconsole::errors::{ConsoleError, ConsoleResult};
use keyconsole::logging::init_logging;
use keyconsole::models::AppName;
use keyconsole::render;

#[derive(Parser, Debug)]
#[command(
    name = "keyconsole",
    version,
    about = "Issue and manage wa-bomb / mail-storm activation keys"
)]
struct Cli {
    /// Base URL of the activation key service
    #[arg(long, global = true, env = "KEYCONSOLE_API_URL")]
    api_url: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true, env = "KEYCONSOLE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Answer yes to confirmation prompts
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new activation key
    Generate(GenerateArgs),
    /// Verify a key against a system id
    Verify {
        #[arg(long, default_value = "wa-bomb")]
        app: AppName,
        #[arg(long)]
        system_id: String,
        #[arg(long)]
        key: String,
    },
    /// List every activation key
    List,
    /// Deactivate a key
    Deactivate { key: String },
    /// Show statistics for a customer email
    Stats { email: String },
    /// Check that the service is up
    Health,
    /// Show the service banner
    Info,
    /// Interactive console (default)
    Interactive,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long, default_value = "wa-bomb")]
    app: AppName,
    #[arg(long)]
    system_id: String,
    /// Customer name
    #[arg(long)]
    name: String,
    /// Customer email
    #[arg(long)]
    email: String,
    /// Customer mobile number
    #[arg(long)]
    mobile: Option<String>,
    /// Validity in days; omit for a key that never expires
    #[arg(long)]
    days: Option<u32>,
}

type AppConsole = Console<HttpKeyService, TerminalNotifier>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut console = match setup(&cli) {
        Ok(console) => console,
        Err(e) => {
            eprintln!("keyconsole: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Failures have already been reported through the notifier.
    match run(&mut console, cli.command).await {
        Ok(code) => code,
        Err(_) => ExitCode::FAILURE,
    }
}

fn setup(cli: &Cli) -> ConsoleResult<AppConsole> {
    let mut config = get_config()?.clone();
    if let Some(url) = &cli.api_url {
        config.api.url = url.trim_end_matches('/').to_string();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    config.validate()?;

    init_logging(config.logging.enabled, &config.logging.level);

    let service = HttpKeyService::from_config(&config)?;
    Ok(Console::new(service, TerminalNotifier::new(cli.yes)))
}

async fn run(console: &mut AppConsole, command: Option<Command>) -> ConsoleResult<ExitCode> {
    match command.unwrap_or(Command::Interactive) {
        Command::Generate(args) => {
            let form = &mut console.generate_form;
            form.app = args.app;
            form.system_id = args.system_id;
            form.customer_name = args.name;
            form.customer_email = args.email;
            form.customer_mobile = args.mobile.unwrap_or_default();
            match args.days {
                Some(days) => {
                    form.validity = Validity::Limited;
                    form.validity_days = days.to_string();
                }
                None => form.validity = Validity::Lifetime,
            }

            let key = console.submit_generate().await?;
            print!("{}", render::render_generated_key(&key));
        }
        Command::Verify {
            app,
            system_id,
            key,
        } => {
            console.select_tab(Tab::Verify).await?;
            console.verify_form.app = app;
            console.verify_form.system_id = system_id;
            console.verify_form.activation_key = key;

            let result = console.submit_verify().await?;
            print!("{}", render::render_verification(&result));
            if !result.valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::List => {
            console.select_tab(Tab::Manage).await?;
            print!("{}", render::render(console));
        }
        Command::Deactivate { key } => match console.deactivate(&key).await {
            Ok(ack) => println!("{}", ack.message),
            Err(ConsoleError::Cancelled) => {
                println!("Deactivation cancelled.");
                return Ok(ExitCode::FAILURE);
            }
            Err(e) => return Err(e),
        },
        Command::Stats { email } => {
            console.select_tab(Tab::CustomerStats).await?;
            console.stats_query.email = email;
            match console.submit_stats().await? {
                Some(stats) => print!("{}", render::render_stats(&stats)),
                None => {
                    println!("No data found for the provided email address");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Health => {
            let result = console.service().health().await;
            let health = report(console, result, "Error checking service health")?;
            println!("{}", render::render_health(&health));
            if !health.is_healthy() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Info => {
            let result = console.service().service_info().await;
            let info = report(console, result, "Error fetching service info")?;
            print!("{}", render::render_service_info(&info));
        }
        Command::Interactive => interactive(console).await?,
    }
    Ok(ExitCode::SUCCESS)
}

fn report<T>(console: &mut AppConsole, result: ConsoleResult<T>, failure: &str) -> ConsoleResult<T> {
    if let Err(e) = &result {
        console.notifier_mut().alert(&format!("{failure}: {e}"));
    }
    result
}

async fn interactive(console: &mut AppConsole) -> ConsoleResult<()> {
    println!("Multi-App Activation Key Manager (type 'help' for commands)");
    println!("Connected to {}\n", console.service().base_url());
    println!("{}", render::render(console));

    let stdin = io::stdin();
    loop {
        print!("keyconsole> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let command = match ConsoleCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        let redraw = !matches!(command, ConsoleCommand::Help);

        match console.execute(command).await {
            Ok(false) => break,
            // Already shown to the user; keep the console running.
            Ok(true) | Err(_) => {}
        }
        if redraw {
            println!("\n{}", render::render(console));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_parses_validity() {
        let cli = Cli::try_parse_from([
            "keyconsole",
            "generate",
            "--app",
            "mail-storm",
            "--system-id",
            "SYS-1",
            "--name",
            "Asha",
            "--email",
            "asha@example.com",
            "--days",
            "30",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Generate(args)) => {
                assert_eq!(args.app, AppName::MailStorm);
                assert_eq!(args.days, Some(30));
                assert_eq!(args.mobile, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_app_is_rejected() {
        let result = Cli::try_parse_from([
            "keyconsole",
            "verify",
            "--app",
            "notepad",
            "--system-id",
            "SYS-1",
            "--key",
            "ABCD",
        ]);
        assert!(result.is_err());
    }

    #[test]
    #[serial_test::serial]
    fn api_url_falls_back_to_env() {
        std::env::set_var("KEYCONSOLE_API_URL", "https://keys.example.com");
        let from_env = Cli::try_parse_from(["keyconsole", "list"]).unwrap();
        let from_flag =
            Cli::try_parse_from(["keyconsole", "list", "--api-url", "http://10.0.0.5:8001"])
                .unwrap();
        std::env::remove_var("KEYCONSOLE_API_URL");

        assert_eq!(from_env.api_url.as_deref(), Some("https://keys.example.com"));
        assert_eq!(from_flag.api_url.as_deref(), Some("http://10.0.0.5:8001"));
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["keyconsole", "--yes"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.yes);
    }
}
