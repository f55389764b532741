fn main() {
    crypto_fetcher::cli::run();
}
