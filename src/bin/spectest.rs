fn main() {
    spectest::cli::run();
}
