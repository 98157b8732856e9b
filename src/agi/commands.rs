//! The AGI command vocabulary.
//!
//! Each method formats one protocol command, executes it through
//! [`Agi::execute`], and converts the reply into a natural return type.
//! String arguments are double-quoted on the wire; an empty argument is
//! sent as `""`. Commands with optional trailing positional arguments
//! emit a trailing value only when it (or any later argument) differs
//! from its default, materializing the earlier defaults so positions
//! still line up for the server.

use super::{Agi, AgiResult};
use crate::error::AgiError;
use tokio::io::{AsyncBufRead, AsyncWrite};

/// Default skip time for [`Agi::control_stream_file`], in milliseconds
const CONTROL_STREAM_FILE_SKIP_TIME: i64 = 3000;

/// Default digit limit for [`Agi::get_data`]
const GET_DATA_MAX_DIGITS: i64 = 1024;

/// TDD mode of a channel (for the deaf)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TddMode {
    On,
    Off,
    Tdd,
    Mate,
}

impl TddMode {
    fn as_wire(self) -> &'static str {
        match self {
            TddMode::On => "ON",
            TddMode::Off => "OFF",
            TddMode::Tdd => "TDD",
            TddMode::Mate => "MATE",
        }
    }
}

/// Surround an argument with double quotes (`""` when empty)
fn quote(item: &str) -> String {
    format!("\"{item}\"")
}

/// Quote an optional single-character argument (`""` when absent)
fn quote_char(item: Option<char>) -> String {
    match item {
        Some(c) => format!("\"{c}\""),
        None => "\"\"".to_string(),
    }
}

/// Interpret a `result=` integer as a DTMF digit (0 means none pressed)
fn digit_from_result(result: i64) -> Option<char> {
    u8::try_from(result)
        .ok()
        .filter(|&byte| byte != 0)
        .map(char::from)
}

impl<R, W> Agi<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Answer the channel if it is not already up
    pub async fn answer(&mut self) -> AgiResult<()> {
        self.execute("ANSWER").await?;
        Ok(())
    }

    /// Get the status of a channel (the current channel when `channel`
    /// is empty).
    ///
    /// Return values:
    /// - 0 — channel is down and available
    /// - 1 — channel is down but reserved
    /// - 2 — channel is off hook
    /// - 3 — digits (or equivalent) have been dialed
    /// - 4 — line is ringing
    /// - 5 — remote end is ringing
    /// - 6 — line is up
    /// - 7 — line is busy
    pub async fn channel_status(&mut self, channel: &str) -> AgiResult<i64> {
        Ok(self
            .execute(&format!("CHANNEL STATUS {}", quote(channel)))
            .await?
            .result)
    }

    /// Play a file with playback control (fast-forward, rewind, pause).
    ///
    /// `skip_time` is the number of milliseconds skipped by a
    /// fast-forward or rewind. Returns the digit pressed, if any.
    pub async fn control_stream_file(
        &mut self,
        filename: &str,
        escape_digits: &str,
        skip_time: i64,
        fastforward: Option<char>,
        rewind: Option<char>,
        pause: Option<char>,
    ) -> AgiResult<Option<char>> {
        let mut command = format!(
            "STREAM FILE {} {}",
            quote(filename),
            quote(escape_digits)
        );

        // trailing defaults are materialized only when a later argument
        // needs its position
        let later = fastforward.is_some() || rewind.is_some() || pause.is_some();
        if skip_time != CONTROL_STREAM_FILE_SKIP_TIME || later {
            command.push_str(&format!(" {skip_time}"));
        }
        if later {
            command.push_str(&format!(" {}", quote_char(fastforward)));
        }
        if rewind.is_some() || pause.is_some() {
            command.push_str(&format!(" {}", quote_char(rewind)));
        }
        if pause.is_some() {
            command.push_str(&format!(" {}", quote_char(pause)));
        }

        Ok(digit_from_result(self.execute(&command).await?.result))
    }

    /// Delete a database key
    pub async fn database_del(&mut self, family: &str, key: &str) -> AgiResult<()> {
        let response = self
            .execute(&format!("DATABASE DEL {} {}", quote(family), quote(key)))
            .await?;
        if response.result == 0 {
            return Err(AgiError::DatabaseError(
                "error deleting database value".to_string(),
            ));
        }
        Ok(())
    }

    /// Delete a database family or key tree
    pub async fn database_deltree(&mut self, family: &str, keytree: &str) -> AgiResult<()> {
        let response = self
            .execute(&format!(
                "DATABASE DELTREE {} {}",
                quote(family),
                quote(keytree)
            ))
            .await?;
        if response.result == 0 {
            return Err(AgiError::DatabaseError(
                "error deleting database family/keytree".to_string(),
            ));
        }
        Ok(())
    }

    /// Get a value out of the Asterisk database, `""` when the key does
    /// not exist
    pub async fn database_get(&mut self, family: &str, key: &str) -> AgiResult<String> {
        Ok(self
            .execute(&format!("DATABASE GET {} {}", quote(family), quote(key)))
            .await?
            .data)
    }

    /// Put a value in the Asterisk database
    pub async fn database_put(
        &mut self,
        family: &str,
        key: &str,
        value: &str,
    ) -> AgiResult<()> {
        let response = self
            .execute(&format!(
                "DATABASE PUT {} {} {}",
                quote(family),
                quote(key),
                quote(value)
            ))
            .await?;
        if response.result == 0 {
            return Err(AgiError::DatabaseError(
                "error putting value in Asterisk database".to_string(),
            ));
        }
        Ok(())
    }

    /// Execute a dialplan application.
    ///
    /// Returns the application's return value, or -2 when the application
    /// was not found.
    pub async fn exec(&mut self, app: &str, options: &str) -> AgiResult<i64> {
        Ok(self
            .execute(&format!("EXEC {} {}", quote(app), quote(options)))
            .await?
            .result)
    }

    /// Stream a file and collect DTMF digits.
    ///
    /// `timeout` is in seconds. Returns the digits received, `""` on
    /// timeout.
    pub async fn get_data(
        &mut self,
        file: &str,
        timeout: i64,
        max_digits: i64,
    ) -> AgiResult<String> {
        let mut command = format!("GET DATA {file}");
        if timeout != 0 || max_digits != GET_DATA_MAX_DIGITS {
            command.push_str(&format!(" {timeout}"));
        }
        if max_digits != GET_DATA_MAX_DIGITS {
            command.push_str(&format!(" {max_digits}"));
        }
        Ok(self.execute(&command).await?.result_string)
    }

    /// Evaluate a full variable expression, handling complex names and
    /// builtin variables.
    ///
    /// `variable` takes dialplan form, e.g. `${CALLERID(num)}`. An empty
    /// `channel` means the current channel. A hangup reported mid-command
    /// yields `"hangup"`.
    pub async fn get_full_variable(
        &mut self,
        variable: &str,
        channel: &str,
    ) -> AgiResult<String> {
        let mut command = format!("GET FULL VARIABLE {}", quote(variable));
        if !channel.is_empty() {
            command.push_str(&format!(" {}", quote(channel)));
        }
        match self.execute(&command).await {
            Ok(response) => Ok(response.data),
            Err(AgiError::HangupByResult) => Ok("hangup".to_string()),
            Err(e) => Err(e),
        }
    }

    /// Stream a file and read a single digit. `timeout` is in seconds.
    pub async fn get_option(
        &mut self,
        file: &str,
        escape_digits: &str,
        timeout: i64,
    ) -> AgiResult<Option<char>> {
        let mut command = format!("GET OPTION {} {}", quote(file), quote(escape_digits));
        if timeout != 0 {
            command.push_str(&format!(" {timeout}"));
        }
        Ok(digit_from_result(self.execute(&command).await?.result))
    }

    /// Get the value of a channel variable, `""` when it does not exist.
    ///
    /// A hangup reported mid-command yields `"hangup"`.
    pub async fn get_variable(&mut self, variable: &str) -> AgiResult<String> {
        match self
            .execute(&format!("GET VARIABLE {}", quote(variable)))
            .await
        {
            Ok(response) => Ok(response.data),
            Err(AgiError::HangupByResult) => Ok("hangup".to_string()),
            Err(e) => Err(e),
        }
    }

    /// Hang up a channel (the current channel when `channel` is empty)
    pub async fn hangup(&mut self, channel: &str) -> AgiResult<()> {
        self.execute(&format!("HANGUP {}", quote(channel))).await?;
        Ok(())
    }

    /// Does nothing
    pub async fn noop(&mut self) -> AgiResult<()> {
        self.execute("NOOP").await?;
        Ok(())
    }

    /// Receive a character from channels supporting it. `timeout` is in
    /// milliseconds.
    pub async fn receive_char(&mut self, timeout: i64) -> AgiResult<Option<char>> {
        Ok(digit_from_result(
            self.execute(&format!("RECEIVE CHAR {timeout}")).await?.result,
        ))
    }

    /// Receive text from channels supporting it. `timeout` is in
    /// milliseconds.
    pub async fn receive_text(&mut self, timeout: i64) -> AgiResult<String> {
        Ok(self
            .execute(&format!("RECEIVE TEXT {timeout}"))
            .await?
            .data)
    }

    /// Record audio to a file until an escape digit is pressed or the
    /// timeout is reached.
    ///
    /// `timeout` is in milliseconds (-1 for none), `silence` the maximum
    /// trailing silence in seconds (0 disables the silence detector),
    /// `offset` the sample offset to start writing at. Returns the digit
    /// pressed, if any.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_file(
        &mut self,
        filename: &str,
        format: &str,
        escape_digits: &str,
        timeout: i64,
        silence: i64,
        beep: bool,
        offset: i64,
    ) -> AgiResult<Option<char>> {
        let mut command = format!(
            "RECORD FILE {} {} {} {}",
            quote(filename),
            quote(format),
            quote(escape_digits),
            timeout
        );
        if offset != 0 {
            command.push_str(&format!(" {offset}"));
        }
        if beep {
            command.push_str(" BEEP");
        }
        if silence > 0 {
            command.push_str(&format!(" s={silence}"));
        }
        Ok(digit_from_result(self.execute(&command).await?.result))
    }

    /// Say a character string
    pub async fn say_alpha(
        &mut self,
        alphanum: &str,
        escape_digits: &str,
    ) -> AgiResult<Option<char>> {
        Ok(digit_from_result(
            self.execute(&format!(
                "SAY ALPHA {} {}",
                quote(alphanum),
                quote(escape_digits)
            ))
            .await?
            .result,
        ))
    }

    /// Say a date given in seconds since the epoch
    pub async fn say_date(&mut self, date: i64, escape_digits: &str) -> AgiResult<Option<char>> {
        Ok(digit_from_result(
            self.execute(&format!("SAY DATE {date} {}", quote(escape_digits)))
                .await?
                .result,
        ))
    }

    /// Say a date and/or time in the given format.
    ///
    /// See `voicemail.conf` for formatting options; the server default is
    /// `ABdY 'digits/at' IMp`. Acceptable `timezone` values are those
    /// under `/usr/share/zoneinfo`.
    pub async fn say_datetime(
        &mut self,
        date: i64,
        escape_digits: &str,
        format: &str,
        timezone: &str,
    ) -> AgiResult<Option<char>> {
        let mut command = format!("SAY DATETIME {date} {}", quote(escape_digits));
        if !format.is_empty() || !timezone.is_empty() {
            command.push_str(&format!(" {}", quote(format)));
        }
        if !timezone.is_empty() {
            command.push_str(&format!(" {}", quote(timezone)));
        }
        Ok(digit_from_result(self.execute(&command).await?.result))
    }

    /// Say a digit string as individual digits
    pub async fn say_digits(
        &mut self,
        digits: i64,
        escape_digits: &str,
    ) -> AgiResult<Option<char>> {
        Ok(digit_from_result(
            self.execute(&format!("SAY DIGITS {digits} {}", quote(escape_digits)))
                .await?
                .result,
        ))
    }

    /// Say a number
    pub async fn say_number(
        &mut self,
        number: i64,
        escape_digits: &str,
    ) -> AgiResult<Option<char>> {
        Ok(digit_from_result(
            self.execute(&format!("SAY NUMBER {number} {}", quote(escape_digits)))
                .await?
                .result,
        ))
    }

    /// Say a character string with phonetics (alpha, bravo, charlie...)
    pub async fn say_phonetic(
        &mut self,
        characters: &str,
        escape_digits: &str,
    ) -> AgiResult<Option<char>> {
        Ok(digit_from_result(
            self.execute(&format!(
                "SAY PHONETIC {} {}",
                quote(characters),
                quote(escape_digits)
            ))
            .await?
            .result,
        ))
    }

    /// Say a time given in seconds since the epoch
    pub async fn say_time(&mut self, time: i64, escape_digits: &str) -> AgiResult<Option<char>> {
        Ok(digit_from_result(
            self.execute(&format!("SAY TIME {time} {}", quote(escape_digits)))
                .await?
                .result,
        ))
    }

    /// Send an image to channels supporting it (most do not). `image`
    /// should not include an extension.
    pub async fn send_image(&mut self, image: &str) -> AgiResult<()> {
        self.execute(&format!("SEND IMAGE {}", quote(image))).await?;
        Ok(())
    }

    /// Send text to channels supporting it (most do not)
    pub async fn send_text(&mut self, text: &str) -> AgiResult<()> {
        self.execute(&format!("SEND TEXT {}", quote(text))).await?;
        Ok(())
    }

    /// Hang the channel up after `delay` seconds; 0 disables any pending
    /// auto hangup
    pub async fn set_autohangup(&mut self, delay: i64) -> AgiResult<()> {
        self.execute(&format!("SET AUTOHANGUP {delay}")).await?;
        Ok(())
    }

    /// Set the callerid for the current channel (a number, or
    /// `"name" <number>`)
    pub async fn set_callerid(&mut self, cid: &str) -> AgiResult<()> {
        self.execute(&format!("SET CALLERID {}", quote(cid))).await?;
        Ok(())
    }

    /// Set the context for continuation upon exiting the application
    pub async fn set_context(&mut self, context: &str) -> AgiResult<()> {
        self.execute(&format!("SET CONTEXT {}", quote(context)))
            .await?;
        Ok(())
    }

    /// Set the extension for continuation upon exiting the application
    pub async fn set_extension(&mut self, extension: &str) -> AgiResult<()> {
        self.execute(&format!("SET EXTENSION {}", quote(extension)))
            .await?;
        Ok(())
    }

    /// Enable or disable the music-on-hold generator
    pub async fn set_music(&mut self, enable: bool, music_class: &str) -> AgiResult<()> {
        let mut command = format!("SET MUSIC {}", if enable { "ON" } else { "OFF" });
        if !music_class.is_empty() {
            command.push_str(&format!(" {}", quote(music_class)));
        }
        self.execute(&command).await?;
        Ok(())
    }

    /// Set the priority for continuation upon exiting the application
    pub async fn set_priority(&mut self, priority: &str) -> AgiResult<()> {
        self.execute(&format!("SET PRIORITY {}", quote(priority)))
            .await?;
        Ok(())
    }

    /// Set a channel variable
    pub async fn set_variable(&mut self, variable: &str, value: &str) -> AgiResult<()> {
        self.execute(&format!(
            "SET VARIABLE {} {}",
            quote(variable),
            quote(value)
        ))
        .await?;
        Ok(())
    }

    /// Play a file on the channel, starting at `offset`. Returns the
    /// digit pressed, if any.
    pub async fn stream_file(
        &mut self,
        filename: &str,
        escape_digits: &str,
        offset: i64,
    ) -> AgiResult<Option<char>> {
        let mut command = format!("STREAM FILE {} {}", quote(filename), quote(escape_digits));
        if offset != 0 {
            command.push_str(&format!(" {offset}"));
        }
        Ok(digit_from_result(self.execute(&command).await?.result))
    }

    /// Change the TDD mode of the channel
    pub async fn tdd_mode(&mut self, mode: TddMode) -> AgiResult<()> {
        self.execute(&format!("TDD MODE {}", mode.as_wire())).await?;
        Ok(())
    }

    /// Log a message to the Asterisk verbose log.
    ///
    /// Newlines in `text` are parsed out into multiple verbose commands,
    /// one per line.
    pub async fn verbose(&mut self, text: &str, level: i64) -> AgiResult<()> {
        for line in text.split('\n') {
            self.execute(&format!("VERBOSE {} {level}", quote(line)))
                .await?;
        }
        Ok(())
    }

    /// Wait for a digit. `timeout` is in milliseconds, -1 for none.
    /// Returns the digit pressed, if any.
    pub async fn wait_for_digit(&mut self, timeout: i64) -> AgiResult<Option<char>> {
        Ok(digit_from_result(
            self.execute(&format!("WAIT FOR DIGIT {timeout}"))
                .await?
                .result,
        ))
    }
}
