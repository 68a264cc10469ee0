fn main() {
    if let Err(e) = ghup::cli::run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
