use asvec::Session;
use asvec::config::Env;
use asvec::prompt::Input;
use asvec::view::View;
use asvec_client::TcpConnector;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let connector = TcpConnector::new();
    let mut session = Session {
        view: View::stdio(),
        input: Input::Terminal,
        env: Env::from_process(),
        connector: &connector,
        shutdown: CancellationToken::new(),
        argv: Vec::new(),
        signals: true,
    };
    let code = asvec::run(std::env::args().collect(), &mut session).await;
    std::process::exit(code);
}
