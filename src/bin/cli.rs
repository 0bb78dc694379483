use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fs;
use std::io::{self, Write};
use workday_core::config::DEFAULT_EXCLUSION_KEYWORDS;
use workday_core::{
    AggregatedFeed, Conversion, WorkdayConfig, WorkdayConverter, WorkdayMap, parse_timezone,
};
use workday_feed::fetch::{DEFAULT_FETCH_TIMEOUT, FeedSource, HttpFeedSource};
use workday_feed::persistence::save_workdays_to_csv;
use workday_feed::telemetry;

fn format_local(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string()
}

fn push_row<'a>(out: &mut String, widths: &[usize], cells: impl Iterator<Item = &'a str>) {
    out.push('|');
    for (ci, cell) in cells.enumerate() {
        out.push(' ');
        out.push_str(cell);
        out.push_str(&" ".repeat(widths[ci].saturating_sub(cell.len())));
        out.push_str(" |");
    }
    out.push('\n');
}

fn render_workdays_as_text_table(records: &WorkdayMap, tz: Tz) -> String {
    let headers = ["workday", "first start", "last end", "hours"];
    let rows: Vec<[String; 4]> = records
        .values()
        .map(|record| {
            let minutes = (record.latest_end - record.earliest_start).num_minutes();
            [
                record.workday.to_string(),
                format_local(record.earliest_start, tz),
                format_local(record.latest_end, tz),
                format!("{}:{:02}", minutes / 60, minutes % 60),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, &widths, headers.iter().copied());
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        push_row(&mut out, &widths, row.iter().map(String::as_str));
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  load <ics_path>                    Read a source calendar from disk\n  fetch <url>                        Download a source calendar (http, https, webcal)\n  tz <zone>                          Set the calendar timezone (e.g. Europe/Stockholm)\n  hour <0-23>                        Set the hour a workday starts\n  summary <text...>                  Set the summary of generated events\n  exclude list                       List exclusion keywords\n  exclude add <term...>              Add an exclusion keyword\n  exclude clear                      Remove all keywords (keep every event)\n  exclude reset                      Restore the default keywords\n  show                               Show settings and the workday table\n  render [path]                      Print the simplified calendar or write it to path\n  export csv <path>                  Write the workday table as CSV\n  quit|exit                          Exit"
    );
}

fn print_settings(config: &WorkdayConfig) {
    let keywords = if config.exclusion_keywords.is_empty() {
        "(none)".to_string()
    } else {
        config.exclusion_keywords.join(", ")
    };
    println!("Timezone           : {}", config.timezone);
    println!("Workday starts at  : {:02}:00", config.day_start_hour);
    println!("Summary            : {}", config.summary);
    println!("Exclusion keywords : {}", keywords);
}

/// Current settings plus the loaded source as `(label, raw text)`.
struct Session {
    config: WorkdayConfig,
    source: Option<(String, String)>,
}

impl Session {
    fn new() -> Self {
        Self {
            config: WorkdayConfig::default(),
            source: None,
        }
    }

    fn converter(&self) -> Result<WorkdayConverter, String> {
        WorkdayConverter::new(self.config.clone()).map_err(|e| e.to_string())
    }

    fn aggregate(&self) -> Option<Result<AggregatedFeed, String>> {
        let (_, raw) = self.source.as_ref()?;
        Some(
            self.converter()
                .and_then(|converter| converter.aggregate(raw).map_err(|e| e.to_string())),
        )
    }

    fn convert(&self) -> Option<Result<Conversion, String>> {
        let (_, raw) = self.source.as_ref()?;
        Some(
            self.converter()
                .and_then(|converter| converter.convert(raw).map_err(|e| e.to_string())),
        )
    }

    fn show(&self) {
        match self.aggregate() {
            None => println!("No calendar loaded. Use 'load <path>' or 'fetch <url>'."),
            Some(Err(e)) => println!("Error converting calendar: {}", e),
            Some(Ok(feed)) => {
                if let Some((label, _)) = &self.source {
                    println!("Source: {}", label);
                }
                println!("{}", feed.summary.to_cli_summary());
                match self.config.timezone() {
                    Ok(tz) => println!("{}", render_workdays_as_text_table(&feed.records, tz)),
                    Err(e) => println!("Error: {}", e),
                }
            }
        }
    }

    fn replace_source(&mut self, label: String, raw: String) {
        self.source = Some((label, raw));
        self.show();
    }
}

fn fetch_source(url: &str) -> Result<String, String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| e.to_string())?;
    runtime.block_on(async {
        let source = HttpFeedSource::new(DEFAULT_FETCH_TIMEOUT).map_err(|e| e.to_string())?;
        source.fetch(url).await.map_err(|e| e.to_string())
    })
}

fn main() {
    telemetry::init_tracing();
    let mut session = Session::new();

    println!("Workday Feed (CLI) - type 'help' for commands\n");
    print_settings(&session.config);
    println!();

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let (cmd, rest) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (input, ""),
        };

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => {
                print_settings(&session.config);
                session.show();
            }
            "load" => {
                if rest.is_empty() {
                    println!("Usage: load <ics_path>");
                    continue;
                }
                match fs::read_to_string(rest) {
                    Ok(raw) => {
                        println!("Calendar loaded from {}.", rest);
                        session.replace_source(rest.to_string(), raw);
                    }
                    Err(e) => println!("Error reading {}: {}", rest, e),
                }
            }
            "fetch" => {
                if rest.is_empty() {
                    println!("Usage: fetch <url>");
                    continue;
                }
                match fetch_source(rest) {
                    Ok(raw) => {
                        println!("Calendar fetched from {}.", rest);
                        session.replace_source(rest.to_string(), raw);
                    }
                    Err(e) => println!("Error fetching calendar: {}", e),
                }
            }
            "tz" => match parse_timezone(rest) {
                Ok(tz) => {
                    session.config.timezone = tz.name().to_string();
                    println!("Timezone set to {}.", tz.name());
                    if session.source.is_some() {
                        session.show();
                    }
                }
                Err(e) => println!("Error: {}", e),
            },
            "hour" => match rest.parse::<u32>() {
                Ok(hour) if hour <= 23 => {
                    session.config.day_start_hour = hour;
                    println!("Workday start set to {:02}:00.", hour);
                    if session.source.is_some() {
                        session.show();
                    }
                }
                _ => println!("Usage: hour <0-23>"),
            },
            "summary" => {
                if rest.is_empty() {
                    println!("Usage: summary <text...>");
                } else {
                    session.config.summary = rest.to_string();
                    println!("Summary set to '{}'.", rest);
                }
            }
            "exclude" => {
                let (sub, term) = match rest.split_once(char::is_whitespace) {
                    Some((sub, term)) => (sub, term.trim()),
                    None => (rest, ""),
                };
                let keywords = &mut session.config.exclusion_keywords;
                match sub {
                    "list" | "" => {}
                    "add" if !term.is_empty() => {
                        let term = term.to_lowercase();
                        if !keywords.contains(&term) {
                            keywords.push(term);
                        }
                    }
                    "clear" => keywords.clear(),
                    "reset" => {
                        *keywords = DEFAULT_EXCLUSION_KEYWORDS
                            .iter()
                            .map(|k| k.to_string())
                            .collect();
                    }
                    _ => {
                        println!("Usage: exclude list|add <term...>|clear|reset");
                        continue;
                    }
                }
                if keywords.is_empty() {
                    println!("Exclusion keywords: (none)");
                } else {
                    println!("Exclusion keywords: {}", keywords.join(", "));
                }
                if sub != "list" && !sub.is_empty() && session.source.is_some() {
                    session.show();
                }
            }
            "render" => match session.convert() {
                None => println!("No calendar loaded. Use 'load <path>' or 'fetch <url>'."),
                Some(Err(e)) => println!("Error converting calendar: {}", e),
                Some(Ok(conversion)) => {
                    if rest.is_empty() {
                        print!("{}", conversion.document);
                    } else {
                        match fs::write(rest, &conversion.document) {
                            Ok(_) => println!(
                                "Calendar written to {} ({} workdays).",
                                rest,
                                conversion.records.len()
                            ),
                            Err(e) => println!("Error writing calendar: {}", e),
                        }
                    }
                }
            },
            "export" => {
                let (fmt, path) = match rest.split_once(char::is_whitespace) {
                    Some((fmt, path)) => (fmt, path.trim()),
                    None => (rest, ""),
                };
                if fmt != "csv" || path.is_empty() {
                    println!("Usage: export csv <path>");
                    continue;
                }
                let tz = match session.config.timezone() {
                    Ok(tz) => tz,
                    Err(e) => {
                        println!("Error: {}", e);
                        continue;
                    }
                };
                match session.aggregate() {
                    None => println!("No calendar loaded. Use 'load <path>' or 'fetch <url>'."),
                    Some(Err(e)) => println!("Error converting calendar: {}", e),
                    Some(Ok(feed)) => match save_workdays_to_csv(&feed.records, tz, path) {
                        Ok(_) => println!("Workdays exported to {}.", path),
                        Err(e) => println!("Error exporting workdays: {}", e),
                    },
                }
            }
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
