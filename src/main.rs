fn main() {
    if let Err(e) = mtdata::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
