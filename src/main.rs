fn main() {
    if let Err(err) = csv_widen::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
