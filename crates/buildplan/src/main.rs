fn main() -> anyhow::Result<()> {
    buildplan::run()
}
