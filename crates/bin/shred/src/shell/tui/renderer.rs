//! Renderer - draws the session as plain ratatui paragraphs

use chrono::DateTime;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use shred_ledger::amount::{format_native_delta, NATIVE_SYMBOL};
use shred_ledger::{format_native, format_units, Asset};

use crate::core::{NoticeLevel, Session, State, VERIFY_POSITIONS};

const PHRASE_COLUMNS: usize = 4;

/// shown for an address the network has no account for
const UNVERIFIED: &str = "Unverified";

pub struct Renderer {
    network: String,
}

impl Renderer {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
        }
    }

    pub fn render(&mut self, f: &mut Frame, session: &Session) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // header
                Constraint::Min(0),    // body
                Constraint::Length(4), // notice + hints
            ])
            .split(f.area());

        self.render_header(f, session, chunks[0]);
        self.render_body(f, session, chunks[1]);
        self.render_footer(f, session, chunks[2]);
    }

    fn render_header(&self, f: &mut Frame, session: &Session, area: Rect) {
        let mut spans = vec![
            Span::styled("shred", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("  [{}]  ", self.network)),
            Span::styled(title(session.state), Style::default().fg(Color::Cyan)),
        ];
        if session.state.is_unlocked() {
            if let Some(address) = &session.address {
                spans.push(Span::styled(
                    format!("  {}", short(address)),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
        let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        f.render_widget(header, area);
    }

    fn render_body(&self, f: &mut Frame, session: &Session, area: Rect) {
        let lines = match session.state {
            State::Welcome => vec![
                Line::from("No wallets found."),
                Line::from(""),
                Line::from("Create a new custodial wallet to get started."),
            ],
            State::WalletList => wallet_list(session),
            State::WalletUnlock => unlock(session),
            State::Create => phrase(session),
            State::Verify => verify(session),
            State::SetPassword => vec![
                Line::from("Phrase verified. Choose a passphrase to encrypt the wallet file."),
                Line::from(""),
                input_line(session),
            ],
            State::Dashboard => dashboard(session),
            State::Receive => receive(session),
            State::TokenMenu => token_menu(session),
            State::History => history(session),
            State::SendSelectAsset => select_asset(session),
            State::SendRecipient => {
                let mut lines = send_summary(session);
                lines.push(Line::from(""));
                lines.push(input_line(session));
                let resolving = session
                    .pending_send
                    .as_ref()
                    .is_some_and(|p| p.recipient_input.is_some() && p.error.is_none());
                if resolving {
                    lines.push(dim("Resolving address..."));
                }
                lines
            }
            State::SendAmount | State::SendSigning => {
                let mut lines = send_summary(session);
                lines.push(Line::from(""));
                lines.push(input_line(session));
                lines
            }
            State::SendConfirm => {
                let mut lines = send_summary(session);
                lines.push(Line::from(""));
                lines.push(Line::from("Sign and submit this transfer?"));
                lines
            }
            State::Locked => vec![
                Line::from("Session locked after inactivity."),
                Line::from(""),
                Line::from("Your recovery phrase has been cleared from memory."),
            ],
        };

        let body = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(body, area);
    }

    fn render_footer(&self, f: &mut Frame, session: &Session, area: Rect) {
        let mut lines = Vec::new();

        let send_error = session
            .pending_send
            .as_ref()
            .and_then(|p| p.error.as_deref())
            .filter(|_| is_send_state(session.state));
        if let Some(error) = send_error {
            lines.push(Line::styled(error.to_string(), Style::default().fg(Color::Red)));
        } else if let Some(notice) = &session.notice {
            let color = match notice.level {
                NoticeLevel::Info => Color::Yellow,
                NoticeLevel::Success => Color::Green,
                NoticeLevel::Error => Color::Red,
            };
            lines.push(Line::styled(notice.text.clone(), Style::default().fg(color)));
        } else {
            lines.push(Line::from(""));
        }
        lines.push(dim(hints(session.state)));

        let footer = Paragraph::new(lines).block(Block::default().borders(Borders::TOP));
        f.render_widget(footer, area);
    }
}

fn title(state: State) -> &'static str {
    match state {
        State::Welcome => "Welcome",
        State::WalletList => "Wallets",
        State::WalletUnlock => "Unlock",
        State::Create => "New wallet",
        State::Verify => "Verify phrase",
        State::SetPassword => "Set passphrase",
        State::Dashboard => "Dashboard",
        State::Receive => "Receive",
        State::TokenMenu => "Tokens",
        State::History => "History",
        State::SendSelectAsset => "Send: asset",
        State::SendRecipient => "Send: recipient",
        State::SendAmount => "Send: amount",
        State::SendConfirm => "Send: confirm",
        State::SendSigning => "Send: sign",
        State::Locked => "Locked",
    }
}

fn hints(state: State) -> &'static str {
    match state {
        State::Welcome => "n new wallet  q quit",
        State::WalletList => "↑/↓ select  enter unlock  n new wallet  q quit",
        State::WalletUnlock => "enter unlock  esc back",
        State::Create => "enter when written down",
        State::Verify | State::SetPassword => "enter confirm",
        State::Dashboard => "s send  r receive  h history  t tokens  f refresh  q quit",
        State::Receive => "c copy account id  e copy address  esc back",
        State::TokenMenu => "↑/↓ select  enter set alias  esc back",
        State::History => "n next  p previous  r reload  esc back",
        State::SendSelectAsset => "↑/↓ select  enter next  esc cancel",
        State::SendRecipient | State::SendAmount => "enter next  esc back",
        State::SendConfirm => "y sign  n cancel  esc back",
        State::SendSigning => "enter sign and submit  esc back",
        State::Locked => "enter unlock  q quit",
    }
}

fn is_send_state(state: State) -> bool {
    matches!(
        state,
        State::SendSelectAsset
            | State::SendRecipient
            | State::SendAmount
            | State::SendConfirm
            | State::SendSigning
    )
}

fn dim(text: impl Into<String>) -> Line<'static> {
    Line::styled(text.into(), Style::default().fg(Color::DarkGray))
}

fn short(address: &str) -> String {
    let chars = address.chars().count();
    if !address.starts_with("0x") || chars <= 14 {
        return address.to_string();
    }
    let head: String = address.chars().take(8).collect();
    let tail: String = address.chars().skip(chars - 4).collect();
    format!("{}…{}", head, tail)
}

/// Prompt when empty, otherwise the value; passphrases are masked
fn input_line(session: &Session) -> Line<'static> {
    let input = &session.input;
    let prompt = Span::styled("> ", Style::default().fg(Color::Cyan));
    if input.is_empty() {
        return Line::from(vec![
            prompt,
            Span::styled(input.placeholder().to_string(), Style::default().fg(Color::DarkGray)),
        ]);
    }
    let shown = if session.state.masks_input() {
        "*".repeat(input.len())
    } else {
        input.value().to_string()
    };
    Line::from(vec![prompt, Span::raw(shown), Span::raw("_")])
}

fn wallet_list(session: &Session) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("Select a wallet:"), Line::from("")];
    for (i, wallet) in session.wallets.iter().enumerate() {
        let selected = i == session.wallet_cursor;
        let marker = if selected { "> " } else { "  " };
        let status = wallet.account_id.as_deref().unwrap_or(UNVERIFIED);
        let text = format!(
            "{}{}  {}  {}  [{}]  created {}",
            marker,
            wallet.file_name,
            short(&wallet.address),
            status,
            wallet.network,
            wallet.created_at.format("%Y-%m-%d")
        );
        let style = if selected {
            Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default()
        };
        lines.push(Line::styled(text, style));
    }
    lines
}

fn unlock(session: &Session) -> Vec<Line<'static>> {
    let file = session
        .wallet_path
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    vec![
        Line::from(format!("Unlocking {}", file)),
        Line::from(""),
        input_line(session),
    ]
}

fn phrase(session: &Session) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::styled(
            "Write down these 24 words in order. They are the only way to recover this wallet.",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
    ];
    let Some(phrase) = session.phrase() else {
        return lines;
    };
    let words = phrase.words();
    for (row, chunk) in words.chunks(PHRASE_COLUMNS).enumerate() {
        let cells: Vec<String> = chunk
            .iter()
            .enumerate()
            .map(|(col, word)| format!("{:>2}. {:<10}", row * PHRASE_COLUMNS + col + 1, word))
            .collect();
        lines.push(Line::from(cells.join("  ")));
    }
    lines
}

fn verify(session: &Session) -> Vec<Line<'static>> {
    vec![
        Line::from(format!(
            "Confirm your phrase ({}/{})",
            session.verify_step + 1,
            VERIFY_POSITIONS.len()
        )),
        Line::from(""),
        input_line(session),
    ]
}

fn dashboard(session: &Session) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let address = session.address.clone().unwrap_or_default();
    lines.push(Line::from(format!("Address:  {}", address)));

    match &session.account_id {
        Some(id) => lines.push(Line::from(format!("Account:  {}", id))),
        None => {
            lines.push(Line::from(format!("Account:  {}", UNVERIFIED)));
            lines.push(dim("Send funds to the address above to create the account."));
        }
    }
    lines.push(Line::from(""));

    match &session.balance {
        Some(balance) => {
            lines.push(Line::styled(
                format!("Balance:  {}", format_native(balance.native)),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            for token in &balance.tokens {
                lines.push(Line::from(format!(
                    "          {} {}",
                    format_units(token.amount, token.decimals),
                    session.token_label(&token.token_id)
                )));
            }
        }
        None if session.refreshing => lines.push(dim("Balance:  loading...")),
        None => lines.push(dim("Balance:  unknown")),
    }

    if session.refreshing && session.balance.is_some() {
        lines.push(dim("refreshing..."));
    }
    if let Some(error) = &session.refresh_error {
        lines.push(Line::styled(
            format!("Refresh failed: {}", error),
            Style::default().fg(Color::Red),
        ));
    }
    lines
}

fn receive(session: &Session) -> Vec<Line<'static>> {
    let account = session
        .account_id
        .as_ref()
        .map(|a| a.to_string())
        .unwrap_or_else(|| UNVERIFIED.into());
    vec![
        Line::from("Share either identifier to receive funds:"),
        Line::from(""),
        Line::from(format!("Account id:   {}", account)),
        Line::from(format!(
            "EVM address:  {}",
            session.address.clone().unwrap_or_default()
        )),
    ]
}

fn token_menu(session: &Session) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, token) in session.tokens().iter().enumerate() {
        let marker = if i == session.token_cursor { "> " } else { "  " };
        let alias = session
            .token_aliases
            .get(&token.token_id)
            .map(|a| format!(" \"{}\"", a))
            .unwrap_or_default();
        lines.push(Line::from(format!(
            "{}{}{}  {}",
            marker,
            token.token_id,
            alias,
            format_units(token.amount, token.decimals)
        )));
    }
    lines.push(Line::from(""));
    lines.push(input_line(session));
    lines
}

fn history(session: &Session) -> Vec<Line<'static>> {
    let view = &session.history;
    let mut lines = vec![Line::from(format!("Page {}", view.page_number())), Line::from("")];

    if view.loading {
        lines.push(dim("loading..."));
        return lines;
    }
    if let Some(error) = &view.error {
        lines.push(Line::styled(
            format!("Could not load history: {}", error),
            Style::default().fg(Color::Red),
        ));
        return lines;
    }
    if view.records.is_empty() {
        lines.push(dim("No transactions."));
        return lines;
    }

    for record in &view.records {
        let color = if record.net_amount < 0 { Color::Red } else { Color::Green };
        let mut spans = vec![
            Span::raw(format!("{:<17} ", timestamp(&record.consensus_timestamp))),
            Span::raw(format!("{:<16} ", record.name)),
            Span::styled(
                format!("{:>18} ", format_native_delta(record.net_amount)),
                Style::default().fg(color),
            ),
            Span::raw(record.result.clone()),
        ];
        if !record.memo.is_empty() {
            spans.push(Span::styled(
                format!("  {}", record.memo),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(spans));
    }
    if view.next.is_none() {
        lines.push(dim("end of history"));
    }
    lines
}

fn select_asset(session: &Session) -> Vec<Line<'static>> {
    let mut rows = vec![format!(
        "{} HBAR  {}",
        NATIVE_SYMBOL,
        session
            .balance
            .as_ref()
            .map(|b| format_native(b.native))
            .unwrap_or_default()
    )];
    for token in session.tokens() {
        rows.push(format!(
            "{}  {}",
            session.token_label(&token.token_id),
            format_units(token.amount, token.decimals)
        ));
    }

    let mut lines = vec![Line::from("What do you want to send?"), Line::from("")];
    for (i, row) in rows.into_iter().enumerate() {
        if i == session.asset_cursor {
            lines.push(Line::styled(
                format!("> {}", row),
                Style::default().add_modifier(Modifier::REVERSED),
            ));
        } else {
            lines.push(Line::from(format!("  {}", row)));
        }
    }
    lines
}

fn send_summary(session: &Session) -> Vec<Line<'static>> {
    let Some(pending) = &session.pending_send else {
        return Vec::new();
    };
    let asset = match &pending.asset {
        Asset::Native => format!("{} HBAR", NATIVE_SYMBOL),
        Asset::Token { id, .. } => session.token_label(id).to_string(),
    };
    let mut lines = vec![Line::from(format!("Asset:   {}", asset))];
    if let Some(recipient) = &pending.recipient {
        lines.push(Line::from(format!("To:      {}", recipient)));
    }
    if let Some(amount) = &pending.amount {
        lines.push(Line::from(format!("Amount:  {}", amount)));
    }
    if session.state == State::SendConfirm {
        // relay transactions carry no memo field
        lines.push(Line::from(format!(
            "Memo:    {} (not recorded on-chain)",
            pending.memo
        )));
    }
    lines
}

/// `secs.nanos` consensus timestamp as UTC minutes
fn timestamp(consensus: &str) -> String {
    consensus
        .split('.')
        .next()
        .and_then(|secs| secs.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| consensus.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PendingSend;

    #[test]
    fn test_timestamp() {
        assert_eq!(timestamp("1700000001.000000002"), "2023-11-14 22:13");
        assert_eq!(timestamp("garbage"), "garbage");
    }

    #[test]
    fn test_short_address() {
        assert_eq!(
            short("0x5a0b54d5dc17e0aadc383d2db43b0a0d3e029c4c"),
            "0x5a0b54…9c4c"
        );
        assert_eq!(short("0.0.1"), "0.0.1");
        assert_eq!(short("Unknown (decrypt to view)"), "Unknown (decrypt to view)");
    }

    #[test]
    fn test_short_address_multibyte() {
        assert_eq!(short("0x€€€€€€€€€€"), "0x€€€€€€€€€€");
        assert_eq!(short("0x€€€€€€€€€€€€€€€€"), "0x€€€€€€…€€€€");
        assert_eq!(short("0xab€cdefghijklmnop"), "0xab€cde…mnop");
    }

    #[test]
    fn test_masked_input_line() {
        let mut session = Session::default();
        session.state = State::SendSigning;
        for c in "hunter2".chars() {
            session.input.push(c);
        }
        let line = input_line(&session);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(!text.contains("hunter2"));
        assert!(text.contains("*******"));
    }

    #[test]
    fn test_confirm_marks_memo_as_local() {
        let mut session = Session::default();
        session.state = State::SendConfirm;
        session.pending_send = Some(PendingSend::new("Sent via shred"));
        let text: Vec<String> = send_summary(&session)
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert!(text
            .iter()
            .any(|l| l == "Memo:    Sent via shred (not recorded on-chain)"));
    }
}
