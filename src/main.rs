use colored::Colorize;

fn main() {
    if let Err(err) = promptvault::run() {
        eprintln!("{} {}", "error:".bright_red(), err);
        std::process::exit(1);
    }
}
