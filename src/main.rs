use anyhow::{anyhow, Result};
use clap::{App as Cli, AppSettings, Arg, ArgMatches, SubCommand};
use log::LevelFilter;
use sfadmin::app::{catalog_for, App};
use sfadmin::cli;
use sfadmin::config::Config;
use sfadmin::error::AppError;
use sfadmin::events::network::query_grid;
use sfadmin::fields::{Catalog, RowStore};
use sfadmin::logger::CustomLogger;
use sfadmin::salesforce::Salesforce;
use sfadmin::ui::Theme;
use std::path::Path;
use std::sync::Arc;

fn arguments<'a, 'b>() -> Cli<'a, 'b> {
    let csv = Arg::with_name("CSV")
        .help("Field rows with one column per attribute")
        .required(true);
    let objects = Arg::with_name("objects")
        .long("objects")
        .short("o")
        .value_name("NAMES")
        .help("Comma-separated target objects; defaults to the configured ones");

    Cli::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::VersionlessSubcommands)
        .arg(
            Arg::with_name("config")
                .long("config")
                .short("c")
                .value_name("DIR")
                .global(true)
                .help("Directory holding config.yml"),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .global(true)
                .help("Log debug output"),
        )
        .subcommand(
            SubCommand::with_name("configure")
                .about("Write the connection settings to config.yml")
                .arg(
                    Arg::with_name("instance-url")
                        .long("instance-url")
                        .value_name("URL")
                        .required(true),
                )
                .arg(
                    Arg::with_name("token")
                        .long("token")
                        .value_name("TOKEN")
                        .required(true),
                )
                .arg(Arg::with_name("api-version").long("api-version").value_name("VERSION"))
                .arg(Arg::with_name("theme").long("theme").value_name("NAME"))
                .arg(objects.clone()),
        )
        .subcommand(
            SubCommand::with_name("validate")
                .about("Check a CSV of field rows and report invalid attributes")
                .arg(csv.clone()),
        )
        .subcommand(
            SubCommand::with_name("payload")
                .about("Print the custom field payload for a CSV of field rows")
                .arg(csv.clone())
                .arg(objects.clone()),
        )
        .subcommand(
            SubCommand::with_name("deploy")
                .about("Create the custom fields of a CSV on the target objects")
                .arg(csv)
                .arg(objects),
        )
        .subcommand(
            SubCommand::with_name("query")
                .about("Run a SOQL query and print the records as CSV")
                .arg(Arg::with_name("SOQL").required(true))
                .arg(
                    Arg::with_name("where")
                        .long("where")
                        .value_name("FILE")
                        .help("JSON filter expression appended to the query"),
                )
                .arg(
                    Arg::with_name("sort")
                        .long("sort")
                        .value_name("COLUMN[:desc]")
                        .help("Sort the records by a column"),
                )
                .arg(
                    Arg::with_name("filter")
                        .long("filter")
                        .value_name("TEXT")
                        .help("Keep records with a cell containing the text"),
                )
                .arg(
                    Arg::with_name("column")
                        .long("column")
                        .value_name("COLUMN")
                        .requires("filter")
                        .help("Restrict the filter to one column"),
                ),
        )
}

fn target_objects(matches: &ArgMatches, config: &Config) -> Vec<String> {
    match matches.value_of("objects") {
        Some(objects) => cli::parse_objects(objects),
        None => config.target_objects.clone(),
    }
}

fn load(catalog: &Catalog, matches: &ArgMatches) -> Result<RowStore> {
    let path = matches.value_of("CSV").unwrap_or_default();
    Ok(cli::load_rows(catalog, Path::new(path))?)
}

fn connect(config: &Config) -> Result<Salesforce> {
    let (instance_url, access_token) = config.connection()?;
    Ok(Salesforce::new(access_token, instance_url, &config.api_version))
}

async fn run_query(matches: &ArgMatches<'_>, config: &Config) -> Result<()> {
    let salesforce = connect(config)?;
    let mut soql = matches.value_of("SOQL").unwrap_or_default().to_string();
    if let Some(path) = matches.value_of("where") {
        soql = cli::apply_where(&soql, &cli::read_expression(Path::new(path))?);
    }

    let mut grid = query_grid(&salesforce, &soql).await?;
    if let Some(sort) = matches.value_of("sort") {
        let (column, direction) = cli::parse_sort(sort)?;
        grid.sort_by(&column, direction)?;
    }
    if let Some(text) = matches.value_of("filter") {
        grid.set_filter(matches.value_of("column"), text)?;
    }
    print!("{}", cli::grid_to_csv(&grid)?);
    Ok(())
}

fn configure(matches: &ArgMatches, mut config: Config) -> Result<()> {
    config.instance_url = matches.value_of("instance-url").map(str::to_string);
    config.access_token = matches.value_of("token").map(str::to_string);
    if let Some(version) = matches.value_of("api-version") {
        config.api_version = version.to_string();
    }
    if let Some(theme) = matches.value_of("theme") {
        if Theme::from_name(theme).is_none() {
            return Err(anyhow!(
                "Unknown theme '{}'; available: {}",
                theme,
                Theme::available_themes().join(", ")
            ));
        }
        config.theme_name = theme.to_string();
    }
    if let Some(objects) = matches.value_of("objects") {
        config.target_objects = cli::parse_objects(objects);
    }
    config.save()?;
    println!("Configuration saved");
    Ok(())
}

async fn run(matches: ArgMatches<'_>, config: Config) -> Result<()> {
    if let ("configure", Some(sub)) = matches.subcommand() {
        return configure(sub, config);
    }
    let salesforce = connect(&config).ok().map(Arc::new);
    let catalog = catalog_for(salesforce.as_ref());

    match matches.subcommand() {
        ("validate", Some(sub)) => {
            let store = load(&catalog, sub)?;
            let issues = cli::row_issues(&catalog, &store);
            if issues.is_empty() {
                println!("{} field row(s) valid", store.rows.len());
                Ok(())
            } else {
                println!("{}", cli::format_issues(&issues));
                Err(anyhow!(
                    "{} of {} field row(s) invalid",
                    issues.len(),
                    store.rows.len()
                ))
            }
        }
        ("payload", Some(sub)) => {
            let store = load(&catalog, sub)?;
            let payload =
                cli::checked_payload(&catalog, &store, &target_objects(sub, &config))?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        ("deploy", Some(sub)) => {
            let store = load(&catalog, sub)?;
            let payload =
                cli::checked_payload(&catalog, &store, &target_objects(sub, &config))?;
            let salesforce = salesforce.ok_or_else(|| anyhow!("No connection configured"))?;
            let results = salesforce.deploy_fields(&payload).await?;
            let failed = results.iter().filter(|r| !r.success).count();
            for result in &results {
                if result.success {
                    let id = result.id.as_deref().unwrap_or("-");
                    println!("created {} ({})", result.full_name, id);
                } else {
                    println!("failed  {}: {}", result.full_name, result.errors.join("; "));
                }
            }
            if failed > 0 {
                return Err(anyhow!("{} of {} field(s) failed", failed, results.len()));
            }
            Ok(())
        }
        ("query", Some(sub)) => run_query(sub, &config).await,
        (name, _) => Err(anyhow!("Unknown command '{}'", name)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = arguments().get_matches();
    let verbose = matches.is_present("verbose");

    let mut config = Config::new();
    config.load(matches.value_of("config"))?;

    if matches.subcommand_name().is_none() {
        let level = if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        return App::start(config, level).await;
    }

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    CustomLogger::stderr(level)
        .install()
        .map_err(|e| AppError::Logger(e.to_string()))?;
    run(matches, config).await
}
