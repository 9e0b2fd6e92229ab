use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use search_facets::command::{parse_filter_value, Command};
use search_facets::composer::QueryComposer;
use search_facets::config::SearchConfig;
use search_facets::sql_compiler::SqlCompiler;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "search_config.json";

const HELP: &str = "\
commands:
  filter <field> <value>     add a filter value (1997-01, 1997-Q1, 1997, text, number)
  toggle <field> <option>    toggle a date option (january..december, q1..q4, 1997)
  compare <field> <kind>     previous_period | previous_year
  remove <index>             remove the facet at a position
  facets                     show active facets
  menu                       show comparison menu items
  query                      show the search query as JSON
  sql                        show the compiled SQL
  quit";

/// Load the search configuration, falling back to the built-in one
fn load_config() -> SearchConfig {
    match SearchConfig::from_json_file(CONFIG_FILE) {
        Ok(config) => {
            info!(file = CONFIG_FILE, fields = config.fields.len(), "loaded search config");
            config
        }
        Err(e) => {
            warn!(error = %e, "using built-in search config");
            SearchConfig::default()
        }
    }
}

fn print_facets(composer: &QueryComposer) {
    let texts = composer.facet_texts();
    if texts.is_empty() {
        println!("(no facets)");
    }
    for (index, text) in texts.iter().enumerate() {
        println!("[{}] {}", index, text);
    }
}

/// Run one command; returns false when the shell should exit
fn execute(command: Command, composer: &mut QueryComposer, compiler: &SqlCompiler) -> Result<bool> {
    match command {
        Command::Filter { field, value } => {
            let field_type = composer
                .config()
                .field(&field)
                .map(|def| def.field_type)
                .with_context(|| format!("unknown field '{}'", field))?;
            let value = parse_filter_value(field_type, &value)?;
            composer.add_filter(&field, value)?;
            print_facets(composer);
        }
        Command::Toggle { field, option } => {
            composer.toggle_date_option(&field, option)?;
            print_facets(composer);
        }
        Command::Compare { field, kind } => {
            composer.add_comparison(&field, kind)?;
            print_facets(composer);
        }
        Command::Remove(index) => {
            composer.remove_facet(index)?;
            print_facets(composer);
        }
        Command::Facets => print_facets(composer),
        Command::Menu => {
            for item in composer.comparison_menu_items() {
                println!("{}", item);
            }
        }
        Command::Query => {
            println!("{}", serde_json::to_string_pretty(&composer.query())?);
        }
        Command::Sql => {
            let result = compiler.compile(&composer.query());
            println!("{}", result.sql);
            for range in &result.time_ranges {
                println!("-- {} range\n{}", range.field, range.range_sql);
                println!("-- {} comparison\n{}", range.field, range.comparison_sql);
            }
            for opt in &result.optimizations {
                println!("• {:?}", opt);
            }
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let config = load_config();
    let compiler = SqlCompiler::new(&config.model);
    let mut composer = QueryComposer::new(config);

    println!("--- search facets shell (type 'help') ---");
    let mut editor = DefaultEditor::new()?;
    loop {
        let line = match editor.readline("search> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if line.trim().is_empty() {
            continue;
        }
        editor.add_history_entry(line.as_str())?;

        let outcome = Command::parse(&line)
            .map_err(anyhow::Error::from)
            .and_then(|command| execute(command, &mut composer, &compiler));
        match outcome {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("✗ {:#}", e),
        }
    }
    Ok(())
}
