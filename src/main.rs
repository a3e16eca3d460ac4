fn main() {
    insights_latency::cli::run();
}
