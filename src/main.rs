//! Binary entrypoint for the cwqso practice bot.
//!
//! Commands:
//! - `practice` - run an interactive QSO on stdin/stdout with think-time pacing
//! - `encode <text>` - print the Morse rendering of some text
//! - `decode <code>` - read Morse (letters separated by spaces, words by `/`)
//! - `analyze <text>` - print the analysis of one line as JSON
//! - `glossary [term]` - list CW abbreviations
//! - `init` - write a starter `cwqso.toml`
//!
//! See the library crate docs for module-level details: `cwqso::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use cwqso::config::Config;
use cwqso::metrics;
use cwqso::qso::lexicon::{Lexicon, ABBREVIATIONS};
use cwqso::qso::{
    decode_morse, encode_morse, start_dispatcher, BotEngine, Difficulty, OutboundReply, QsoType,
    Session, SessionUpdate, Speed, StdRandom, TextAnalyzer,
};

#[derive(Parser)]
#[command(name = "cwqso")]
#[command(about = "Practice CW QSOs against a simulated station")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "cwqso.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive practice QSO
    Practice {
        /// QSO type: casual, contest, dx, ragchew, training
        #[arg(short = 't', long)]
        qso_type: Option<QsoType>,
        /// Your own callsign
        #[arg(short, long)]
        peer: Option<String>,
        /// Operate the bot as this catalog station
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
        #[arg(long)]
        speed: Option<Speed>,
        /// RNG seed for a reproducible session
        #[arg(long)]
        seed: Option<u64>,
        /// Reply immediately instead of after a simulated think time
        #[arg(long)]
        no_delay: bool,
        /// Let the bot call CQ first
        #[arg(long)]
        bot_first: bool,
    },
    /// Encode text to Morse
    Encode {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Decode Morse to text
    Decode {
        #[arg(required = true)]
        code: Vec<String>,
    },
    /// Print the analysis of one line as JSON
    Analyze {
        #[arg(required = true)]
        text: Vec<String>,
        /// Callsign the bot operates as
        #[arg(long, default_value = "F4BOT")]
        self_call: String,
        /// Configured operator callsign
        #[arg(short, long)]
        peer: Option<String>,
    },
    /// List CW abbreviations, or explain one
    Glossary { term: Option<String> },
    /// Write a starter configuration file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Practice {
            qso_type,
            peer,
            profile,
            difficulty,
            speed,
            seed,
            no_delay,
            bot_first,
        } => {
            let mut config = pre_config.unwrap_or_default();
            if let Some(t) = qso_type {
                config.bot.qso_type = t;
            }
            if let Some(d) = difficulty {
                config.bot.difficulty = d;
            }
            if let Some(s) = speed {
                config.bot.speed = s;
            }
            if peer.is_some() {
                config.bot.peer_callsign = peer;
            }
            if profile.is_some() {
                config.bot.profile = profile;
            }
            if seed.is_some() {
                config.bot.seed = seed;
            }
            if no_delay {
                config.pacing.min_think_ms = 0;
                config.pacing.max_think_ms = 0;
            }
            config.validate()?;
            run_practice(config, bot_first).await?;
        }
        Commands::Encode { text } => {
            println!("{}", encode_morse(&text.join(" ")));
        }
        Commands::Decode { code } => {
            println!("{}", decode_morse(&code.join(" ")));
        }
        Commands::Analyze {
            text,
            self_call,
            peer,
        } => {
            let analyzer = TextAnalyzer::new(Lexicon::shared());
            let analysis = analyzer.analyze(&text.join(" "), &self_call, peer.as_deref());
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Commands::Glossary { term } => match term {
            Some(t) => match Lexicon::abbreviation(&t) {
                Some(meaning) => println!("{:<6} {}", t.to_ascii_uppercase(), meaning),
                None => return Err(anyhow!("No entry for '{}'", t)),
            },
            None => {
                for (abbr, meaning) in ABBREVIATIONS {
                    println!("{:<6} {}", abbr, meaning);
                }
            }
        },
        Commands::Init => {
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
    }

    Ok(())
}

/// Interactive loop: operator lines from stdin, bot replies printed when due.
/// Lines starting with `/` are session commands.
async fn run_practice(config: Config, bot_first: bool) -> Result<()> {
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<OutboundReply>();
    let dispatcher = start_dispatcher(config.dispatch_config(), out_tx);
    let printer = tokio::spawn(async move {
        while let Some(reply) = out_rx.recv().await {
            println!("<< {}", reply.text);
            println!("   {}", reply.morse);
        }
    });

    let rng = Box::new(StdRandom::from_seed_option(config.bot.seed));
    let engine = BotEngine::new(config.session_options(), config.lexicon(), rng);
    let mut session = Session::with_dispatcher(engine, dispatcher.clone());
    info!(
        "Practice session {} as {} ({})",
        session.id,
        session.engine().profile().callsign,
        config.bot.qso_type
    );
    println!("Type your CW as text. Commands: /cq /reset /state /peer <call> /type <type> /quit");

    if bot_first {
        session.start()?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(cmd) = line.strip_prefix('/') {
            let mut parts = cmd.split_whitespace();
            match (parts.next().unwrap_or(""), parts.next()) {
                ("quit", _) | ("q", _) => break,
                ("cq", _) => {
                    session.start()?;
                }
                ("reset", _) => {
                    session.reset()?;
                    println!("-- reset; now operating as {}", session.engine().profile().callsign);
                }
                ("state", _) => {
                    println!("{}", serde_json::to_string_pretty(&session.engine().snapshot())?);
                }
                ("peer", arg) => {
                    let update = SessionUpdate {
                        peer_callsign: Some(arg.map(str::to_string)),
                        ..SessionUpdate::default()
                    };
                    match session.engine_mut().configure(update) {
                        Ok(()) => println!("-- peer callsign: {}", arg.unwrap_or("(none)")),
                        Err(e) => println!("-- {}", e),
                    }
                }
                ("type", Some(t)) => match t.parse::<QsoType>() {
                    Ok(qso_type) => {
                        let update = SessionUpdate {
                            qso_type: Some(qso_type),
                            ..SessionUpdate::default()
                        };
                        if let Err(e) = session.engine_mut().configure(update) {
                            println!("-- {}", e);
                        } else {
                            println!("-- QSO type {} from the next QSO on", qso_type);
                        }
                    }
                    Err(e) => println!("-- {}", e),
                },
                (other, _) => println!("-- unknown command '{}'", other),
            }
            continue;
        }
        session.handle_line(line)?;
    }

    // Let replies still in flight go out before stopping.
    let grace = Duration::from_millis(config.pacing.max_think_ms + 500);
    let deadline = tokio::time::Instant::now() + grace;
    while tokio::time::Instant::now() < deadline {
        match dispatcher.snapshot().await {
            Some(stats) if stats.queued > 0 => {
                let tick = config.pacing.scheduler_tick_ms.max(10);
                tokio::time::sleep(Duration::from_millis(tick)).await
            }
            _ => break,
        }
    }
    if let Some(stats) = dispatcher.snapshot().await {
        if stats.queued > 0 {
            warn!("{} replies still queued at exit", stats.queued);
        }
    }
    dispatcher.shutdown().await;
    drop(session);
    let _ = printer.await;

    let m = metrics::snapshot();
    info!(
        "Session summary: qsos_started={} qsos_completed={} implicit_resets={} \
         replies_delivered={} replies_cancelled={}",
        m.qsos_started,
        m.qsos_completed,
        m.implicit_resets,
        m.replies_delivered,
        m.replies_cancelled
    );
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level_filter())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    let log_file = config.as_ref().and_then(|c| c.logging.file.clone());
    if let Some(file) = log_file {
        if let Ok(f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file)
        {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));

            // Mirror to the console only when stderr is a terminal
            let is_tty = atty::is(atty::Stream::Stderr);

            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
            let _ = builder.try_init();
            return;
        }
    }
    builder.format(|fmt, record| {
        writeln!(
            fmt,
            "{} [{}] {}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
            record.level(),
            record.args()
        )
    });
    let _ = builder.try_init();
}
