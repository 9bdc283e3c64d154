//! Dashboard, receive, token aliases and transaction history

use shred_ledger::{HistoryPage, NetworkError};
use tracing::{debug, warn};

use super::app::SessionMachine;
use super::effect::Effect;
use super::event::Key;
use super::types::{HistoryDirection, HistoryRequest, HistoryView, Notice, State, Ticket};

impl SessionMachine {
    pub(super) fn dashboard_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Char('f') => self.start_refresh(),
            Key::Char('s') => self.begin_send(),
            Key::Char('h') => self.open_history(),
            Key::Char('r') => {
                self.session.state = State::Receive;
                Vec::new()
            }
            Key::Char('t') => {
                if self.session.tokens().is_empty() {
                    self.session.notice = Some(Notice::info("No tokens held"));
                    return Vec::new();
                }
                self.session.token_cursor = 0;
                self.session.input.reset("Alias for selected token");
                self.session.state = State::TokenMenu;
                Vec::new()
            }
            Key::Char('q') => self.quit(),
            _ => Vec::new(),
        }
    }

    pub(super) fn receive_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Esc | Key::Enter => {
                self.session.state = State::Dashboard;
                Vec::new()
            }
            Key::Char('c') => match &self.session.account_id {
                Some(id) => {
                    self.session.notice = Some(Notice::success("Account id copied"));
                    vec![Effect::CopyToClipboard(id.to_string())]
                }
                None => {
                    self.session.notice = Some(Notice::info("Account not active yet"));
                    Vec::new()
                }
            },
            Key::Char('e') => match &self.session.address {
                Some(address) => {
                    let copy = Effect::CopyToClipboard(address.clone());
                    self.session.notice = Some(Notice::success("Address copied"));
                    vec![copy]
                }
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    pub(super) fn token_menu_key(&mut self, key: Key) -> Vec<Effect> {
        let count = self.session.tokens().len();
        match key {
            Key::Esc => {
                self.session.input.clear();
                self.session.state = State::Dashboard;
            }
            Key::Up => {
                self.session.token_cursor = self.session.token_cursor.saturating_sub(1);
            }
            Key::Down => {
                if self.session.token_cursor + 1 < count {
                    self.session.token_cursor += 1;
                }
            }
            Key::Enter => {
                let alias = self.session.input.take().trim().to_string();
                let Some(token_id) = self
                    .session
                    .tokens()
                    .get(self.session.token_cursor)
                    .map(|t| t.token_id.clone())
                else {
                    return Vec::new();
                };
                if alias.is_empty() {
                    return Vec::new();
                }
                self.session.token_aliases.insert(token_id.clone(), alias);
                self.persist_metadata(|meta, session| {
                    meta.token_aliases = session.token_aliases.clone();
                });
                self.session.notice = Some(Notice::success(format!("Alias updated for {}", token_id)));
            }
            _ => {}
        }
        Vec::new()
    }

    // ===== History =====

    fn open_history(&mut self) -> Vec<Effect> {
        self.session.history = HistoryView::default();
        self.session.state = State::History;
        self.fetch_history(HistoryRequest::first())
    }

    fn fetch_history(&mut self, request: HistoryRequest) -> Vec<Effect> {
        let Some(address) = self.session.address.clone() else {
            return Vec::new();
        };
        self.session.history.loading = true;
        self.session.history.error = None;
        vec![Effect::FetchHistory {
            ticket: self.session.ticket(),
            address,
            request,
        }]
    }

    pub(super) fn history_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Esc | Key::Char('q') => {
                self.session.state = State::Dashboard;
                Vec::new()
            }
            _ if self.session.history.loading => Vec::new(),
            Key::Char('n') => match self.session.history.next.clone() {
                Some(cursor) => self.fetch_history(HistoryRequest {
                    cursor: Some(cursor),
                    direction: HistoryDirection::Forward,
                }),
                None => Vec::new(),
            },
            Key::Char('p') => match self.session.history.back_stack.last().cloned() {
                Some(cursor) => self.fetch_history(HistoryRequest {
                    cursor,
                    direction: HistoryDirection::Back,
                }),
                None => Vec::new(),
            },
            Key::Char('r') => {
                // reload in place, the stack is kept
                self.fetch_history(HistoryRequest {
                    cursor: self.session.history.current.clone(),
                    direction: HistoryDirection::First,
                })
            }
            _ => Vec::new(),
        }
    }

    pub(super) fn on_history_fetched(
        &mut self,
        ticket: Ticket,
        request: HistoryRequest,
        result: Result<HistoryPage, NetworkError>,
    ) -> Vec<Effect> {
        if !self.is_current(ticket) {
            debug!(epoch = ticket.epoch, "stale history page dropped");
            return Vec::new();
        }
        let history = &mut self.session.history;
        history.loading = false;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!("history fetch failed: {}", e);
                history.error = Some(e.to_string());
                return Vec::new();
            }
        };

        match request.direction {
            HistoryDirection::First => {
                if request.cursor.is_none() {
                    history.back_stack.clear();
                }
            }
            HistoryDirection::Forward => {
                history.back_stack.push(history.current.take());
            }
            HistoryDirection::Back => {
                history.back_stack.pop();
            }
        }
        history.current = request.cursor;
        history.records = page.transactions;
        history.next = page.next;
        history.error = None;
        Vec::new()
    }
}
