use anyhow::{anyhow, Result};
use carbure_lists::app::{split_filter, App, ListRequest, ScreenKind};
use carbure_lists::config::Config;
use carbure_lists::logger::CustomLogger;
use clap::{crate_version, App as ClapApp, Arg, ArgMatches};
use log::LevelFilter;
use std::str::FromStr;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = ClapApp::new("carbure-lists")
        .version(crate_version!())
        .about("Lists balances, operations and SAF tickets from CarbuRe")
        .arg(
            Arg::with_name("screen")
                .help("List to show")
                .required(true)
                .possible_values(ScreenKind::NAMES),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("DIR")
                .help("Custom configuration directory")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("entity")
                .short("e")
                .long("entity")
                .value_name("ID")
                .help("Entity to list for, overrides the configured one")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("year")
                .short("y")
                .long("year")
                .value_name("YEAR")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("filter")
                .short("f")
                .long("filter")
                .value_name("KEY=VALUE")
                .help("Filter value, repeat for several values")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .validator(|arg| split_filter(&arg).map(|_| ())),
        )
        .arg(
            Arg::with_name("search")
                .short("s")
                .long("search")
                .value_name("TERM")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("sort")
                .long("sort")
                .value_name("COLUMN")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("desc")
                .long("desc")
                .requires("sort")
                .help("Sort in descending order"),
        )
        .arg(
            Arg::with_name("page")
                .short("p")
                .long("page")
                .value_name("N")
                .help("Zero-based page index")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("limit")
                .short("l")
                .long("limit")
                .value_name("N")
                .help("Rows per page: 10, 25, 50 or 100")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("options")
                .long("options")
                .value_name("FILTER")
                .help("Print the values a filter can take instead of the rows")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Log requests to stderr"),
        )
        .get_matches();

    let level = if matches.is_present("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    CustomLogger::new(level).init()?;

    let mut config = Config::new();
    config.load(matches.value_of("config"))?;

    let kind = matches
        .value_of("screen")
        .and_then(ScreenKind::parse)
        .ok_or_else(|| anyhow!("Unknown list"))?;
    let request = ListRequest {
        entity_id: parse(&matches, "entity")?,
        year: parse(&matches, "year")?,
        filters: matches
            .values_of("filter")
            .map(|values| values.map(split_filter).collect::<Result<Vec<_>, _>>())
            .transpose()
            .map_err(|e| anyhow!(e))?
            .unwrap_or_default(),
        search: matches.value_of("search").map(str::to_owned),
        sort: matches.value_of("sort").map(str::to_owned),
        descending: matches.is_present("desc"),
        page: parse(&matches, "page")?,
        limit: parse(&matches, "limit")?,
        options: matches.value_of("options").map(str::to_owned),
    };

    App::start(config, kind, request).await
}

fn parse<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    matches
        .value_of(name)
        .map(|value| {
            value
                .parse()
                .map_err(|e| anyhow!("Invalid --{} '{}': {}", name, value, e))
        })
        .transpose()
}
