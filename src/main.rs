use clap::{Arg, ArgAction, ArgMatches, Command};
use npsp_settings::keywords::registry::normalize_name;
use npsp_settings::{
    AutomationDriver, ChromeDriver, Config, KeywordRegistry, KeywordResult, LocatorTable,
    Locators, SettingsPage,
};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("npsp-settings")
        .about("Drive the NPSP Settings page of a Salesforce org")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("JSON configuration file"),
        )
        .arg(
            Arg::new("locators")
                .long("locators")
                .value_name("FILE")
                .help("JSON locator table replacing the built-in one"),
        )
        .arg(
            Arg::new("login-url")
                .long("login-url")
                .value_name("URL")
                .help("Pre-authenticated URL visited before opening settings"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .value_name("URL")
                .help("Org base URL, overrides org.base_url"),
        )
        .arg(
            Arg::new("headed")
                .long("headed")
                .action(ArgAction::SetTrue)
                .help("Show the Chrome window instead of running headless"),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .action(ArgAction::SetTrue)
                .help("Print the available keywords and exit"),
        )
        .arg(
            Arg::new("keyword")
                .value_name("KEYWORD")
                .required_unless_present("list"),
        )
        .arg(
            Arg::new("args")
                .value_name("ARGS")
                .num_args(0..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true),
        )
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<Config> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config.org.base_url = base_url.clone();
    }
    if matches.get_flag("headed") {
        config.browser.headless = false;
    }
    config.validate()?;
    Ok(config)
}

fn load_locators(matches: &ArgMatches) -> anyhow::Result<Arc<dyn Locators>> {
    let table = match matches.get_one::<String>("locators") {
        Some(path) => LocatorTable::from_file(path)?,
        None => LocatorTable::npsp_defaults(),
    };
    Ok(Arc::new(table))
}

async fn run(matches: &ArgMatches, keyword: &str) -> anyhow::Result<KeywordResult> {
    let config = load_config(matches)?;
    let locators = load_locators(matches)?;
    let args: Vec<String> = matches
        .get_many::<String>("args")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let registry = KeywordRegistry::<ChromeDriver>::with_settings_keywords();
    if registry.get_keyword(keyword).is_none() {
        anyhow::bail!("unknown keyword '{}', see --list", keyword);
    }

    info!(headless = config.browser.headless, "launching Chrome");
    let driver = ChromeDriver::launch(&config.browser)?;

    if let Some(login_url) = matches.get_one::<String>("login-url") {
        info!("visiting login URL");
        driver.navigate(login_url).await?;
        tokio::time::sleep(Duration::from_millis(
            config.timeouts.navigation_settle_ms,
        ))
        .await;
    }

    let page = SettingsPage::new(driver, locators, config)?;
    if normalize_name(keyword) != "opensettingspage" {
        page.open_settings_page().await?;
    }

    Ok(registry.execute(keyword, args, &page).await?)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();

    if matches.get_flag("list") {
        for metadata in KeywordRegistry::<ChromeDriver>::with_settings_keywords().get_all_metadata()
        {
            println!("{:<45} {}", metadata.name, metadata.description);
        }
        return ExitCode::SUCCESS;
    }

    let keyword = matches
        .get_one::<String>("keyword")
        .cloned()
        .unwrap_or_default();

    let (result, code) = match run(&matches, &keyword).await {
        Ok(result) => (result, ExitCode::SUCCESS),
        Err(e) => {
            error!(keyword = %keyword, error = %e, "keyword failed");
            (KeywordResult::failure(e.to_string()), ExitCode::FAILURE)
        }
    };

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => error!(error = %e, "could not serialize keyword result"),
    }
    code
}
