use classad_rust::{
    classads_from_json, classads_to_json, parse_classads, parse_expr, parse_old_classads, ClassAd,
    ClassAdError, JsonStyle, MatchClassAd, ParseError,
};
use clap::Parser;
use std::io::{self, Read};
use std::process::ExitCode;

/// Read ClassAds from stdin and print them as JSON, evaluate an expression
/// against each of them, or match a pair.
#[derive(Parser, Debug)]
#[command(name = "classad")]
#[command(about = "Parse, evaluate and match ClassAds", long_about = None)]
struct Args {
    /// Input is old-format (`name = expr` lines, blank-line separated)
    #[arg(long, conflicts_with = "json")]
    old: bool,

    /// Input is JSON (one object or an array of objects)
    #[arg(long)]
    json: bool,

    /// Evaluate this expression in each record and print the result
    #[arg(long, value_name = "EXPR")]
    eval: Option<String>,

    /// Match the first two records against each other
    #[arg(long = "match", conflicts_with = "eval")]
    match_pair: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    use tracing_subscriber::{fmt, EnvFilter};

    // RUST_LOG controls the log level; default to WARN.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let mut input = String::new();
    if let Err(err) = io::stdin().read_to_string(&mut input) {
        eprintln!("Failed to read stdin: {}", err);
        return ExitCode::FAILURE;
    }

    match run(&args, &input) {
        Ok(()) => ExitCode::SUCCESS,
        Err(ClassAdError::Parse(err)) => {
            report(&input, &err);
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, input: &str) -> Result<(), ClassAdError> {
    let ads = if args.old {
        parse_old_classads(input)?
    } else if args.json {
        classads_from_json(input)?
    } else {
        parse_classads(input)?
    };

    if args.match_pair {
        return print_match(&ads);
    }

    if let Some(source) = &args.eval {
        let expr = match parse_expr(source) {
            Ok(expr) => expr,
            Err(err) => {
                report(source, &err);
                return Err(ClassAdError::Shape("Invalid --eval expression".to_string()));
            }
        };
        for ad in &ads {
            println!("{}", ad.evaluate_expr(&expr));
        }
        return Ok(());
    }

    let style = if args.pretty {
        JsonStyle::Pretty
    } else {
        JsonStyle::Compact
    };
    println!("{}", classads_to_json(&ads, style)?);
    Ok(())
}

fn print_match(ads: &[ClassAd]) -> Result<(), ClassAdError> {
    let [left, right, ..] = ads else {
        return Err(ClassAdError::Shape(format!(
            "--match needs two records, got {}",
            ads.len()
        )));
    };
    let pair = MatchClassAd::pair(left, right);
    println!("match: {}", pair.matches());
    let rank = |r: Option<f64>| r.map_or_else(|| "undefined".to_string(), |r| r.to_string());
    println!("left rank: {}", rank(pair.evaluate_rank_left()));
    println!("right rank: {}", rank(pair.evaluate_rank_right()));
    Ok(())
}

/// Print the offending line with the error span underlined.
fn report(input: &str, err: &ParseError) {
    let lines: Vec<&str> = input.lines().collect();
    let line_num = err.begin.line;
    let line_text = lines.get(line_num).copied().unwrap_or("");

    eprintln!("ERROR AT LINE {}:", line_num + 1);
    eprintln!("{}", line_text);

    let start_col = err.begin.column;
    let end_col = if err.begin.line == err.end.line && err.end.column > err.begin.column {
        err.end.column
    } else if start_col < line_text.len() {
        // Point error or spans multiple lines: underline to end of line
        line_text.len()
    } else {
        start_col + 1
    };

    let mut underline = " ".repeat(start_col);
    underline.push('^');
    if end_col > start_col + 1 {
        underline.push_str(&"_".repeat(end_col - start_col - 1));
    }

    eprintln!("{}", underline);
    eprintln!("{}", err.message);
}
