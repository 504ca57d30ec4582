fn main() -> anyhow::Result<()> {
    query_mapper::run()
}
