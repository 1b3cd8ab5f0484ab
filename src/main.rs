use std::process;

fn main() {
    let args = logicd::app::parse();
    if let Err(err) = logicd::app::run(args) {
        eprintln!("logicd: {err}");
        process::exit(exitcode::SOFTWARE);
    }
}
