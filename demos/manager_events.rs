//! Manager demo: log in, watch queue events, exit on Ctrl+C.
//!
//! Usage: cargo run --example manager_events -- <host> <user> <password>

use asterisk_ami_rs::actions::{Events, EventMask, Login, Logoff};
use asterisk_ami_rs::{AmiError, ManagerConnection, Message};
use tracing::{error, info};

fn print_event(event: &Message) {
    info!(
        "queue member {} paused={}",
        event.get_or_default("MemberName"),
        event.get_or_default("Paused")
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let [_, host, user, password] = args.as_slice() else {
        eprintln!("Usage: {} <host> <user> <password>", args[0]);
        std::process::exit(1);
    };

    let mut connection = match ManagerConnection::connect_default(host).await {
        Ok(connection) => connection,
        Err(AmiError::Io(e)) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
            error!("connection refused - is Asterisk listening on {}:5038?", host);
            return Err(e.into());
        }
        Err(e) => {
            error!("failed to connect: {}", e);
            return Err(e.into());
        }
    };
    info!(
        "connected to {} version {}",
        connection.name(),
        connection.version()
    );

    connection
        .execute(&mut Login::new(user.as_str(), password.as_str()))
        .await?;
    connection.execute(&mut Events::new(EventMask::On)).await?;

    let _queue_members = connection.register_event("QueueMember", print_event);
    let mut seen = 0u64;
    let _all = connection.register_event("", move |event| {
        seen += 1;
        info!("event #{}: {}", seen, event.primary().unwrap_or("?"));
    });

    info!("listening for events, press Ctrl+C to exit");
    loop {
        tokio::select! {
            result = connection.wait_event() => {
                result?;
                connection.pump_messages().await?;
                connection.process_events();
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    connection.execute(&mut Logoff).await?;
    connection.disconnect().await?;
    Ok(())
}
