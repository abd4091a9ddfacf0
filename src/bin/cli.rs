use anyhow::{anyhow, bail, Context, Result};
use crabbooth::testing::{Journal, MockCamera, MockIo, MockLights, MockSpooler};
use crabbooth::{Booth, BoothConfig, ButtonId, Devices, InputHandle};
use std::env;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

fn main() -> Result<()> {
    crabbooth::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: crabbooth-cli <run|check-config|default-config> [args]");
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "run" => cmd_run(&args),
        "check-config" => cmd_check_config(&args),
        "default-config" => cmd_default_config(&args),
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

/// Value following `flag`, if the flag is present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>> {
    match args.iter().position(|a| a == flag) {
        Some(i) => args
            .get(i + 1)
            .map(|v| Some(v.as_str()))
            .ok_or_else(|| anyhow!("{} needs a value", flag)),
        None => Ok(None),
    }
}

fn load_config(args: &[String]) -> Result<BoothConfig> {
    let path = flag_value(args, "--config")?
        .map(PathBuf::from)
        .unwrap_or_else(BoothConfig::default_path);
    let config = BoothConfig::load_from_file(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    config
        .validate()
        .map_err(|e| anyhow!("invalid configuration in {}: {}", path.display(), e))?;
    Ok(config)
}

fn cmd_run(args: &[String]) -> Result<()> {
    // Parse args: run [--config <path>] [--job-polls <n>]
    let config = load_config(args)?;
    let job_polls: u32 = match flag_value(args, "--job-polls")? {
        Some(n) => n.parse().context("--job-polls expects a number")?,
        None => 30,
    };

    let journal = Journal::new();
    let spooler = MockSpooler::new(journal.clone());
    spooler.auto_complete_after(job_polls);

    let devices = Devices {
        camera: MockCamera::new(journal.clone()).with_files(),
        spooler: spooler.clone(),
        lights: MockLights::new(journal.clone(), config.io.pixel_count),
        io: Arc::new(MockIo::new(journal)),
    };
    let mut booth = Booth::new(config, devices).context("creating booth")?;

    let handle = booth.input_handle();
    let on_signal = handle.clone();
    ctrlc::set_handler(move || on_signal.request_exit()).context("installing Ctrl-C handler")?;

    std::thread::spawn(move || read_commands(handle, spooler));

    println!("Booth running. Commands: single multi dome print retry relay exit fault <msg> clear-fault");
    booth.run()?;
    Ok(())
}

/// Map stdin words to button edges until EOF, then request exit.
fn read_commands(handle: InputHandle, spooler: MockSpooler) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };
        let line = line.trim();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));

        match word {
            "" => {}
            "exit" => handle.request_exit(),
            "fault" => spooler.set_printer_fault(Some(rest.trim())),
            "clear-fault" => spooler.set_printer_fault(None),
            _ => match word.parse::<ButtonId>() {
                Ok(id) => {
                    if !handle.press(id) {
                        println!("{} ignored (disabled, unwired or bouncing)", id);
                    }
                }
                Err(()) => println!("Unknown command: {}", word),
            },
        }
    }
    handle.request_exit();
}

fn cmd_check_config(args: &[String]) -> Result<()> {
    let config = load_config(args)?;
    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("{}", toml::to_string_pretty(&config)?);
    }
    Ok(())
}

fn cmd_default_config(args: &[String]) -> Result<()> {
    let path = match args.get(2) {
        Some(p) if p.starts_with("--") => bail!("Usage: crabbooth-cli default-config [<path>]"),
        Some(p) => PathBuf::from(p),
        None => BoothConfig::default_path(),
    };
    BoothConfig::default()
        .save_to_file(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
