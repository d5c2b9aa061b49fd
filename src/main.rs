#[actix_web::main]
async fn main() -> std::io::Result<()> {
    syllabus_server::run().await
}
