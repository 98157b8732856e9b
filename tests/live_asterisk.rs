//! Tests against a live Asterisk server.
//!
//! Ignored by default; run with a reachable manager account:
//!
//! ```sh
//! AMI_HOST=127.0.0.1 AMI_USER=admin AMI_SECRET=secret \
//!     cargo test --test live_asterisk -- --ignored
//! ```

use asterisk_ami_rs::actions::{ListCommands, Login, Logoff, Ping};
use asterisk_ami_rs::{ManagerConnection, DEFAULT_AMI_PORT};

fn live_config() -> Option<(String, String, String)> {
    Some((
        std::env::var("AMI_HOST").ok()?,
        std::env::var("AMI_USER").ok()?,
        std::env::var("AMI_SECRET").ok()?,
    ))
}

#[tokio::test]
#[ignore = "requires a live Asterisk server"]
async fn login_ping_logoff() {
    let (host, user, secret) = live_config().expect("AMI_HOST/AMI_USER/AMI_SECRET not set");

    let mut connection = ManagerConnection::connect(&host, DEFAULT_AMI_PORT)
        .await
        .unwrap();
    assert!(connection.is_connected());
    assert!(!connection.name().is_empty());

    connection
        .execute(&mut Login::new(&user, &secret))
        .await
        .unwrap();

    let response = connection.send_action(&Ping).await.unwrap();
    assert!(response == "Success" || response == "Pong");

    let commands = connection.send_action(&ListCommands).await.unwrap();
    assert!(commands.len() > 1);

    connection.execute(&mut Logoff).await.unwrap();
}
