//! Gateway demo: answer the call, play a prompt, read back the pressed
//! digit, hang up.
//!
//! Point an Asterisk dialplan at this binary:
//!
//! ```text
//! exten => 100,1,AGI(/usr/local/bin/agi_hello)
//! ```

use asterisk_ami_rs::agi::Agi;
use asterisk_ami_rs::AgiError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut agi = Agi::new().await?;

    let channel = agi.env("agi_channel").to_string();
    agi.verbose(&format!("agi_hello servicing {channel}"), 1)
        .await?;

    match run_call(&mut agi).await {
        Ok(()) => Ok(()),
        // a hangup mid-script is a normal way for a call to end
        Err(AgiError::HangupBySignal) | Err(AgiError::HangupByResult) => Ok(()),
        Err(e) => {
            eprintln!("agi_hello failed: {e}");
            std::process::exit(1);
        }
    }
}

async fn run_call(
    agi: &mut asterisk_ami_rs::StdioAgi,
) -> Result<(), AgiError> {
    agi.answer().await?;

    if let Some(digit) = agi.stream_file("welcome", "0123456789", 0).await? {
        if let Some(value) = digit.to_digit(10) {
            agi.say_digits(value as i64, "").await?;
        }
    }

    agi.set_variable("AGI_HELLO_RAN", "1").await?;
    agi.hangup("").await?;
    Ok(())
}
