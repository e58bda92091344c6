use agentsim::app::run_cli;

fn output_header() -> &'static str {
    "agentsim\nStaged agent-to-agent payment simulation: step runner, state snapshots and client view."
}

fn run() -> Result<(), String> {
    println!("{}\n", output_header());
    let args: Vec<String> = std::env::args().skip(1).collect();
    let output = run_cli(args)?;
    println!("{output}");
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
