#[tokio::main]
async fn main() {
    church_backend::run().await;
}
