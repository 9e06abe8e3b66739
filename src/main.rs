fn main() {
    if let Err(err) = backupper::cli::run() {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
