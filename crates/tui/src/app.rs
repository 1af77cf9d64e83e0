use std::{cmp, io, ops::Range, path::Path, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use heroes_core::{
    admin::{AdminError, AdminPanel, Commit, FormError, FormField},
    catalogue::{Catalogue, CatalogueView, PeriodPreset},
    models::Hero,
    remote::{ApiError, HeroesApi, Mutation, MutationSync, Outbox, SyncEvent, UploadedImage},
    token::TokenStore,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use tokio::{spawn, sync::mpsc};
use tracing::{error, info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_PASSWORD_LEN: usize = 128;
const CARD_AWARDS: usize = 2;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    accent_alt: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Red,
            accent_alt: Color::Yellow,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::LightRed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Catalogue,
    Admin,
}

/// Masked password field shown over the catalogue.
#[derive(Debug, Clone, Default)]
struct LoginPrompt {
    input: String,
    cursor: usize,
    error: Option<String>,
}

impl LoginPrompt {
    fn char_len(&self) -> usize {
        self.input.chars().count()
    }

    fn byte_index(&self, cursor: usize) -> usize {
        self.input
            .char_indices()
            .nth(cursor)
            .map(|(idx, _)| idx)
            .unwrap_or(self.input.len())
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.char_len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    fn insert(&mut self, ch: char) {
        if self.char_len() >= MAX_PASSWORD_LEN || ch.is_control() {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.input.insert(at, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.input.remove(at);
    }

    fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.input.remove(at);
        }
    }

    fn masked(&self) -> String {
        "•".repeat(self.char_len())
    }
}

/// Scroll window over a list whose length is derived on every frame.
#[derive(Debug, Clone, Copy, Default)]
struct ListCursor {
    cursor: usize,
    offset: usize,
    height: usize,
}

impl ListCursor {
    fn reset(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    fn move_by(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.reset();
            return;
        }
        let idx = (self.cursor as isize + delta).clamp(0, len as isize - 1);
        self.cursor = idx as usize;
        self.ensure_visible(len);
    }

    fn move_to(&mut self, index: usize, len: usize) {
        if len == 0 {
            return;
        }
        self.cursor = index.min(len - 1);
        self.ensure_visible(len);
    }

    fn page(&mut self, direction: isize, len: usize) {
        if len == 0 || self.height == 0 {
            return;
        }
        let delta = self.height.min(len) as isize;
        self.move_by(direction * delta, len);
    }

    fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.reset();
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    fn ensure_visible(&mut self, len: usize) {
        if len == 0 || self.height == 0 {
            self.offset = 0;
            return;
        }
        let max_offset = len.saturating_sub(self.height);
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + self.height {
            self.offset = self.cursor + 1 - self.height;
        }
        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }

    fn window(&self, len: usize) -> Range<usize> {
        let start = self.offset.min(len);
        start..(self.offset + self.height).min(len)
    }
}

enum AppEvent {
    Input(Event),
    Tick,
    HeroesLoaded(Result<Vec<Hero>, ApiError>),
    LoginFinished(Result<String, ApiError>),
    ImageUploaded(Result<UploadedImage, ApiError>),
}

/// High-level application state for the catalogue TUI.
pub struct HeroesApp {
    api: HeroesApi,
    tokens: TokenStore,
    token: Option<String>,
    periods: Vec<PeriodPreset>,
    period_index: usize,
    catalogue: Catalogue,
    admin: AdminPanel,
    state: UiState,
    screen: Screen,
    login: Option<LoginPrompt>,
    focus: FormField,
    pending_load: bool,
    pending_login: bool,
    pending_upload: bool,
    outbox: Outbox,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    sync_tx: mpsc::Sender<SyncEvent>,
    sync_rx: Option<mpsc::Receiver<SyncEvent>>,
    theme: Theme,
}

impl HeroesApp {
    pub fn new(api: HeroesApi, tokens: TokenStore, periods: Vec<PeriodPreset>) -> Self {
        let token = match tokens.load() {
            Ok(token) => token,
            Err(err) => {
                warn!(?err, "Ignoring unreadable session token");
                None
            }
        };
        let (sync_tx, sync_rx) = mpsc::channel(32);
        Self {
            api,
            tokens,
            token,
            periods,
            period_index: 0,
            catalogue: Catalogue::default(),
            admin: AdminPanel::default(),
            state: UiState::default(),
            screen: Screen::Catalogue,
            login: None,
            focus: FormField::Name,
            pending_load: false,
            pending_login: false,
            pending_upload: false,
            outbox: Outbox::new(),
            event_tx: None,
            sync_tx,
            sync_rx: Some(sync_rx),
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);
        self.start_load();

        let mut sync_rx = self.sync_rx.take();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            if let Some(rx) = sync_rx.as_mut() {
                let mut sync_closed = false;
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        if !self.process_app_event(maybe_event) {
                            break;
                        }
                    }
                    maybe_sync = rx.recv() => {
                        match maybe_sync {
                            Some(event) => self.handle_sync_event(event),
                            None => sync_closed = true,
                        }
                    }
                }
                if sync_closed {
                    sync_rx = None;
                }
            } else {
                let maybe_event = event_rx.recv().await;
                if !self.process_app_event(maybe_event) {
                    break;
                }
            }

            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn start_load(&mut self) {
        if self.pending_load {
            return;
        }
        let Some(sender) = self.event_tx.clone() else {
            error!("event_channel_missing");
            return;
        };
        self.pending_load = true;
        self.state.set_status("Загрузка героев…".to_string());
        info!("Fetching heroes");
        let api = self.api.clone();
        spawn(async move {
            let result = api.fetch_heroes().await;
            let _ = sender.send(AppEvent::HeroesLoaded(result)).await;
        });
    }

    fn start_login(&mut self) {
        if self.pending_login {
            return;
        }
        let Some(password) = self.login.as_ref().map(|prompt| prompt.input.clone()) else {
            return;
        };
        if password.is_empty() {
            if let Some(prompt) = self.login.as_mut() {
                prompt.error = Some("Введите пароль".to_string());
            }
            return;
        }
        let Some(sender) = self.event_tx.clone() else {
            error!("event_channel_missing");
            return;
        };
        self.pending_login = true;
        self.state.set_status("Вход…".to_string());
        let api = self.api.clone();
        spawn(async move {
            let result = api.authenticate(&password).await;
            let _ = sender.send(AppEvent::LoginFinished(result)).await;
        });
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    self.state.set_status(format!("Ошибка: {err}"));
                }
                true
            }
            Some(AppEvent::Tick) => {
                self.handle_tick();
                true
            }
            Some(AppEvent::HeroesLoaded(result)) => {
                self.pending_load = false;
                match result {
                    Ok(heroes) => {
                        info!(total = heroes.len(), "Heroes loaded");
                        self.catalogue.set_heroes(heroes.clone());
                        self.admin.reset(heroes);
                        self.state.list.clamp(self.catalogue.visible().len());
                        self.state.admin_list.clamp(self.admin.len());
                        self.state
                            .set_status(format!("Загружено героев: {}", self.catalogue.total()));
                    }
                    Err(err) => {
                        error!(?err, "Fetching heroes failed");
                        self.state
                            .set_status(format!("Не удалось загрузить героев: {err}"));
                    }
                }
                true
            }
            Some(AppEvent::ImageUploaded(result)) => {
                self.handle_upload_result(result);
                true
            }
            Some(AppEvent::LoginFinished(result)) => {
                self.pending_login = false;
                self.handle_login_result(result);
                true
            }
            None => false,
        }
    }

    fn handle_tick(&mut self) {
        if self.state.mode == Mode::Search {
            self.state
                .set_status(format!("Поиск: {}", self.catalogue.query()));
        }
    }

    fn handle_login_result(&mut self, result: Result<String, ApiError>) {
        match result {
            Ok(token) => {
                info!("Admin login succeeded");
                if let Err(err) = self.tokens.save(&token) {
                    error!(?err, "Failed to persist session token");
                }
                self.token = Some(token);
                self.login = None;
                self.open_admin();
                self.state
                    .set_status("Вход выполнен. Добро пожаловать в админ-панель".to_string());
            }
            Err(ApiError::Unauthorized) => {
                warn!("Admin login rejected");
                if let Some(prompt) = self.login.as_mut() {
                    prompt.error = Some("Неверный пароль".to_string());
                }
                self.state.set_status("Ошибка входа".to_string());
            }
            Err(err) => {
                error!(?err, "Admin login failed");
                if let Some(prompt) = self.login.as_mut() {
                    prompt.error = Some("Не удалось выполнить вход".to_string());
                }
                self.state.set_status(format!("Ошибка входа: {err}"));
            }
        }
    }

    fn handle_sync_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Created { local_id, hero } => {
                let deleted_locally = self.outbox.deletes(local_id);
                let replay = self.outbox.acknowledge(local_id, hero.id);
                if deleted_locally {
                    info!(local_id, id = hero.id, "Created hero was deleted before acknowledgement");
                } else {
                    match self.admin.reassign_id(local_id, hero.id) {
                        Ok(()) => {
                            info!(local_id, id = hero.id, "Hero persisted remotely");
                            self.publish_admin_changes();
                            self.state.set_status(format!("Сохранено: {}", hero.name));
                        }
                        Err(err) => {
                            error!(?err, local_id, remote_id = hero.id, "Remote id conflicts with local list");
                            self.state
                                .set_status(format!("Конфликт идентификаторов: {err}"));
                        }
                    }
                }
                for mutation in replay {
                    self.send_mutation(mutation);
                }
            }
            SyncEvent::Updated(hero) => {
                info!(id = hero.id, "Hero update persisted remotely");
                self.state.set_status(format!("Сохранено: {}", hero.name));
            }
            SyncEvent::Deleted { id, existed } => {
                info!(id, existed, "Hero delete persisted remotely");
            }
            SyncEvent::Failed { mutation, id, error } => {
                if mutation == "create" {
                    let dropped = self.outbox.abandon(id);
                    if dropped > 0 {
                        warn!(id, dropped, "Dropped changes queued behind a failed create");
                    }
                }
                error!(mutation, id, %error, "Remote sync failed");
                self.state.set_status(format!(
                    "Изменение сохранено локально, но не на сервере ({mutation}): {error}"
                ));
            }
        }
    }

    fn dispatch_mutation(&mut self, mutation: Mutation) {
        if self.token.is_none() {
            warn!(mutation = mutation.label(), "No session token; change kept locally");
            return;
        }
        match self.outbox.route(mutation) {
            Some(mutation) => self.send_mutation(mutation),
            None => self
                .state
                .set_status("Изменение будет отправлено после сохранения героя".to_string()),
        }
    }

    fn send_mutation(&mut self, mutation: Mutation) {
        let Some(token) = self.token.clone() else {
            warn!(mutation = mutation.label(), id = mutation.target(), "No session token; change kept locally");
            return;
        };
        let sync = MutationSync::new(self.api.clone(), token);
        let sender = self.sync_tx.clone();
        spawn(async move {
            if let Err(err) = sync.run(mutation, sender).await {
                error!("Mutation sync task error: {err}");
            }
        });
    }

    fn start_upload(&mut self) {
        if self.pending_upload {
            return;
        }
        let value = self.admin.form().field(FormField::Image).trim().to_string();
        if value.is_empty() || value.starts_with("http://") || value.starts_with("https://") {
            self.state
                .set_status("Введите путь к файлу изображения, затем Ctrl-U".to_string());
            return;
        }
        let Some(token) = self.token.clone() else {
            self.state.set_status("Требуется вход".to_string());
            return;
        };
        let Some(sender) = self.event_tx.clone() else {
            error!("event_channel_missing");
            return;
        };
        self.pending_upload = true;
        self.state.set_status(format!("Загрузка изображения {value}…"));
        info!(path = %value, "Uploading image");
        let api = self.api.clone();
        spawn(async move {
            let result = api.upload_image_file(Path::new(&value), &token).await;
            let _ = sender.send(AppEvent::ImageUploaded(result)).await;
        });
    }

    fn handle_upload_result(&mut self, result: Result<UploadedImage, ApiError>) {
        self.pending_upload = false;
        match result {
            Ok(uploaded) => {
                if self.admin.is_dialog_open() {
                    *self.admin.form_mut().field_mut(FormField::Image) = uploaded.url.clone();
                    self.state.set_status("Изображение загружено".to_string());
                } else {
                    warn!(url = %uploaded.url, "Upload finished after the dialog closed");
                }
            }
            Err(err) => {
                error!(?err, "Image upload failed");
                self.state
                    .set_status(format!("Не удалось загрузить изображение: {err}"));
            }
        }
    }

    /// The admin list is what the catalogue shows from now on.
    fn publish_admin_changes(&mut self) {
        self.catalogue.set_heroes(self.admin.heroes().to_vec());
        self.state.list.clamp(self.catalogue.visible().len());
        self.state.admin_list.clamp(self.admin.len());
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if self.login.is_some() {
            return self.handle_login_key(key);
        }
        match self.screen {
            Screen::Catalogue => match self.catalogue.view() {
                CatalogueView::List => match self.state.mode {
                    Mode::Search => self.handle_search_key(key),
                    Mode::Browse => self.handle_browse_key(key),
                },
                CatalogueView::Detail(_) => self.handle_detail_key(key),
            },
            Screen::Admin => {
                if self.admin.is_dialog_open() {
                    self.handle_form_key(key)
                } else {
                    self.handle_admin_key(key)
                }
            }
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.state.mode = Mode::Browse;
                self.state.set_status("Поиск завершён".to_string());
            }
            KeyCode::Enter => {
                self.state.mode = Mode::Browse;
                self.state.set_status(format!(
                    "Найдено героев: {}",
                    self.catalogue.visible().len()
                ));
            }
            KeyCode::Backspace => {
                self.catalogue.pop_query_char();
                self.state.list.reset();
                self.state
                    .set_status(format!("Поиск: {}", self.catalogue.query()));
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.catalogue.push_query_char(c);
                    self.state.list.reset();
                    self.state
                        .set_status(format!("Поиск: {}", self.catalogue.query()));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Result<()> {
        let len = self.catalogue.visible().len();
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.list.move_by(1, len),
            KeyCode::Char('k') | KeyCode::Up => self.state.list.move_by(-1, len),
            KeyCode::Char('g') if key.modifiers.is_empty() => self.state.list.move_to(0, len),
            KeyCode::Char('G') => self.state.list.move_to(usize::MAX, len),
            KeyCode::Home => self.state.list.move_to(0, len),
            KeyCode::End => self.state.list.move_to(usize::MAX, len),
            KeyCode::PageDown => self.state.list.page(1, len),
            KeyCode::PageUp => self.state.list.page(-1, len),
            KeyCode::Char('/') => {
                self.state.mode = Mode::Search;
                self.state
                    .set_status("Поиск по имени или званию…".to_string());
            }
            KeyCode::Esc => {
                if !self.catalogue.query().is_empty() {
                    self.catalogue.set_query(String::new());
                    self.state.list.reset();
                    self.state.set_status("Поиск сброшен".to_string());
                }
            }
            KeyCode::Tab | KeyCode::Char('p') => self.cycle_period(1),
            KeyCode::BackTab | KeyCode::Char('P') => self.cycle_period(-1),
            KeyCode::Char('r') if key.modifiers.is_empty() => self.cycle_region(1),
            KeyCode::Char('R') => self.cycle_region(-1),
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.start_load();
            }
            KeyCode::Char('a') if key.modifiers.is_empty() => {
                if self.token.is_some() {
                    self.open_admin();
                } else {
                    self.login = Some(LoginPrompt::default());
                    self.state
                        .set_status("Введите пароль для доступа к админ-панели".to_string());
                }
            }
            KeyCode::Enter => {
                if let Some(id) = self.current_catalogue_hero().map(|hero| hero.id) {
                    if self.catalogue.select(id) {
                        self.state.detail_scroll = 0;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Left | KeyCode::Char('b') => {
                self.catalogue.back();
                self.state.set_status("Назад к списку".to_string());
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.detail_scroll = self.state.detail_scroll.saturating_add(1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.detail_scroll = self.state.detail_scroll.saturating_sub(1);
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> Result<()> {
        let mut cancel = false;
        let mut submit = false;
        if let Some(prompt) = self.login.as_mut() {
            match key.code {
                KeyCode::Esc => cancel = true,
                KeyCode::Enter => submit = true,
                KeyCode::Left => prompt.move_cursor(-1),
                KeyCode::Right => prompt.move_cursor(1),
                KeyCode::Home => prompt.move_home(),
                KeyCode::End => prompt.move_end(),
                KeyCode::Backspace => prompt.backspace(),
                KeyCode::Delete => prompt.delete(),
                KeyCode::Char(ch) => {
                    if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                        prompt.insert(ch);
                        prompt.error = None;
                    }
                }
                _ => {}
            }
        }

        if cancel {
            self.login = None;
            self.state.set_status("Вход отменён".to_string());
        } else if submit {
            self.start_login();
        }
        Ok(())
    }

    fn handle_admin_key(&mut self, key: KeyEvent) -> Result<()> {
        let len = self.admin.len();
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            KeyCode::Esc => {
                self.screen = Screen::Catalogue;
                self.publish_admin_changes();
                self.state.set_status("Каталог".to_string());
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.admin_list.move_by(1, len),
            KeyCode::Char('k') | KeyCode::Up => self.state.admin_list.move_by(-1, len),
            KeyCode::PageDown => self.state.admin_list.page(1, len),
            KeyCode::PageUp => self.state.admin_list.page(-1, len),
            KeyCode::Char('n') => {
                self.admin.start_create();
                self.focus = FormField::Name;
                self.state
                    .set_status("Добавить нового героя".to_string());
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(id) = self.current_admin_hero().map(|hero| hero.id) {
                    if self.admin.start_edit(id) {
                        self.focus = FormField::Name;
                        self.state.set_status("Редактировать героя".to_string());
                    }
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.current_admin_hero().map(|hero| hero.id) {
                    self.delete_hero(id);
                }
            }
            KeyCode::Char('L') => {
                if let Err(err) = self.tokens.clear() {
                    error!(?err, "Failed to clear session token");
                }
                self.token = None;
                self.screen = Screen::Catalogue;
                self.publish_admin_changes();
                self.state.set_status("Выход выполнен".to_string());
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.admin.cancel();
                self.state.set_status("Отмена".to_string());
            }
            KeyCode::Char('s') if ctrl => self.submit_form(),
            KeyCode::Char('u') if ctrl && self.focus == FormField::Image => self.start_upload(),
            KeyCode::Tab | KeyCode::Down => self.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(-1),
            KeyCode::Enter => {
                if self.focus.is_multiline() {
                    self.admin.form_mut().field_mut(self.focus).push('\n');
                } else {
                    self.move_focus(1);
                }
            }
            KeyCode::Backspace => {
                self.admin.form_mut().field_mut(self.focus).pop();
            }
            KeyCode::Char(c) => {
                if !ctrl {
                    self.admin.form_mut().field_mut(self.focus).push(c);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn submit_form(&mut self) {
        match self.admin.submit() {
            Ok(commit) => {
                self.publish_admin_changes();
                let message = match &commit {
                    Commit::Created(_) => {
                        self.state.admin_list.move_to(usize::MAX, self.admin.len());
                        "Герой добавлен"
                    }
                    Commit::Updated(_) => "Герой обновлен",
                };
                self.state
                    .set_status(format!("{message}: {}", commit.hero().name));
                let mutation = match commit {
                    Commit::Created(hero) => Mutation::Create(hero),
                    Commit::Updated(hero) => Mutation::Update(hero),
                };
                self.dispatch_mutation(mutation);
            }
            Err(err) => {
                if let AdminError::Form(FormError::MissingField(field)) = &err {
                    self.focus = *field;
                }
                warn!(%err, "Hero form rejected");
                self.state.set_status(format!("Ошибка: {err}"));
            }
        }
    }

    fn delete_hero(&mut self, id: i64) {
        match self.admin.delete(id) {
            Some(hero) => {
                self.catalogue.forget(id);
                self.publish_admin_changes();
                self.state
                    .set_status(format!("Герой удален: {}", hero.name));
                self.dispatch_mutation(Mutation::Delete(id));
            }
            None => self
                .state
                .set_status("Запись уже удалена".to_string()),
        }
    }

    fn open_admin(&mut self) {
        self.screen = Screen::Admin;
        self.state.admin_list.clamp(self.admin.len());
    }

    fn move_focus(&mut self, delta: isize) {
        let len = FormField::ALL.len() as isize;
        let next = (self.focus.index() as isize + delta).rem_euclid(len) as usize;
        self.focus = FormField::ALL[next];
    }

    fn cycle_period(&mut self, delta: isize) {
        if self.periods.is_empty() {
            return;
        }
        let len = self.periods.len() as isize;
        self.period_index = (self.period_index as isize + delta).rem_euclid(len) as usize;
        let preset = &self.periods[self.period_index];
        self.catalogue.set_period(preset.selection());
        self.state.list.reset();
        self.state.set_status(format!("Период: {}", preset.label));
    }

    fn cycle_region(&mut self, delta: isize) {
        self.catalogue.cycle_region(delta);
        self.state.list.reset();
        let region = &self.catalogue.filter().region;
        let label = if region.is_all() {
            "Все регионы".to_string()
        } else {
            region.to_string()
        };
        self.state.set_status(format!("Регион: {label}"));
    }

    fn current_catalogue_hero(&self) -> Option<&Hero> {
        self.catalogue.visible().get(self.state.list.cursor).copied()
    }

    fn current_admin_hero(&self) -> Option<&Hero> {
        self.admin.heroes().get(self.state.admin_list.cursor)
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Catalogue => {
                let selected = self.catalogue.selected().cloned();
                match selected {
                    Some(hero) => self.draw_detail(frame, &hero),
                    None => self.draw_catalogue(frame),
                }
            }
            Screen::Admin => self.draw_admin(frame),
        }
        if self.admin.is_dialog_open() && self.screen == Screen::Admin {
            self.render_form(frame);
        }
        if let Some(prompt) = &self.login {
            self.render_login_prompt(frame, prompt);
        }
    }

    fn draw_catalogue(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(size);

        self.render_search_bar(frame, chunks[0]);
        self.render_filters(frame, chunks[1]);

        if self.catalogue.is_empty_result() {
            self.render_no_results(frame, chunks[2]);
        } else {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                .split(chunks[2]);
            self.render_hero_list(frame, body[0]);
            self.render_hero_card(frame, body[1]);
        }
        self.render_status(frame, chunks[3]);
    }

    fn render_search_bar(&self, frame: &mut Frame, area: Rect) {
        let style = if self.state.mode == Mode::Search {
            Style::default().fg(self.theme.accent_alt)
        } else {
            Style::default().fg(self.theme.primary_fg)
        };
        let query = self.catalogue.query();
        let content = if query.is_empty() && self.state.mode == Mode::Browse {
            Line::from(Span::styled(
                "Поиск по имени или званию… (/)",
                Style::default().fg(self.theme.muted),
            ))
        } else {
            Line::from(vec![
                Span::styled("/ ", Style::default().fg(self.theme.accent)),
                Span::styled(query.to_string(), style),
            ])
        };
        let title = Span::styled(
            "Герои России",
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        );
        let paragraph =
            Paragraph::new(content).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);
    }

    fn render_filters(&self, frame: &mut Frame, area: Rect) {
        let parts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(area);

        let titles: Vec<Line> = self
            .periods
            .iter()
            .map(|preset| Line::from(preset.label.clone()))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.period_index)
            .block(Block::default().borders(Borders::ALL).title("Период (Tab)"))
            .style(Style::default().fg(self.theme.muted))
            .highlight_style(
                Style::default()
                    .fg(self.theme.accent_alt)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, parts[0]);

        let region = &self.catalogue.filter().region;
        let label = if region.is_all() {
            "Все регионы".to_string()
        } else {
            region.to_string()
        };
        let paragraph = Paragraph::new(label)
            .block(Block::default().borders(Borders::ALL).title("Регион (r)"));
        frame.render_widget(paragraph, parts[1]);
    }

    fn render_no_results(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Найдено героев: 0");
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Герои не найдены",
                Style::default()
                    .fg(self.theme.warning)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Попробуйте изменить критерии поиска или фильтрации",
                Style::default().fg(self.theme.muted),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_hero_list(&mut self, frame: &mut Frame, area: Rect) {
        let len = self.catalogue.visible().len();
        self.state.list.height = area.height.saturating_sub(2) as usize;
        self.state.list.clamp(len);
        self.state.list.ensure_visible(len);

        let window = self.state.list.window(len);
        let cursor = self.state.list.cursor;
        let offset = self.state.list.offset;
        let visible = self.catalogue.visible();
        let items: Vec<ListItem> = visible[window.clone()]
            .iter()
            .enumerate()
            .map(|(idx, hero)| {
                let is_selected = offset + idx == cursor;
                let marker = if is_selected {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let name = Span::styled(
                    hero.name.clone(),
                    Style::default()
                        .fg(self.theme.primary_fg)
                        .add_modifier(Modifier::BOLD),
                );
                let rank = Span::styled(
                    format!(" · {}", hero.rank),
                    Style::default().fg(self.theme.muted),
                );
                ListItem::new(Line::from(vec![marker, name, rank]))
            })
            .collect();

        let mut list_state = ListState::default();
        if !items.is_empty() {
            list_state.select(Some(cursor.saturating_sub(offset).min(items.len() - 1)));
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Найдено героев: {len}"));
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_hero_card(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Герой");
        let Some(hero) = self.current_catalogue_hero() else {
            let paragraph = Paragraph::new("Нет данных").block(block);
            frame.render_widget(paragraph, area);
            return;
        };
        let mut lines = vec![
            Line::from(Span::styled(
                hero.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                hero.rank.clone(),
                Style::default().fg(self.theme.muted),
            )),
            Line::from(hero.period.clone()),
            Line::from(Span::styled(
                hero.conflict.clone(),
                Style::default().fg(self.theme.accent_alt),
            )),
        ];
        if !hero.region.is_empty() {
            lines.push(Line::from(hero.region.clone()));
        }
        lines.push(Line::from(""));
        let awards: Vec<Span> = hero
            .award_summary(CARD_AWARDS)
            .into_iter()
            .map(|award| Span::styled(format!("[{award}] "), Style::default().fg(self.theme.success)))
            .collect();
        lines.push(Line::from(awards));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Enter: подробнее",
            Style::default().fg(self.theme.muted),
        )));
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_detail(&mut self, frame: &mut Frame, hero: &Hero) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(size);

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                hero.name.clone(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(hero.rank.clone()),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("← Назад к списку (Esc)"),
        );
        frame.render_widget(header, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(33), Constraint::Percentage(67)])
            .split(chunks[1]);

        let facts = vec![
            Line::from(Span::styled(
                "Годы жизни",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(hero.period.clone()),
            Line::from(""),
            Line::from(Span::styled(
                "Конфликт",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(hero.conflict.clone()),
            Line::from(""),
            Line::from(Span::styled(
                "Регион",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(hero.region.clone()),
            Line::from(""),
            Line::from(Span::styled(
                "Год рождения",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(hero.birth_year.to_string()),
            Line::from(""),
            Line::from(Span::styled(hero.image.clone(), Style::default().fg(self.theme.muted))),
        ];
        frame.render_widget(
            Paragraph::new(facts)
                .block(Block::default().borders(Borders::ALL).title("Сведения"))
                .wrap(Wrap { trim: true }),
            body[0],
        );

        let mut story = vec![
            Line::from(Span::styled(
                "Биография",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(hero.biography.clone()),
            Line::from(""),
            Line::from(Span::styled(
                "Награды и звания",
                Style::default()
                    .fg(self.theme.accent_alt)
                    .add_modifier(Modifier::BOLD),
            )),
        ];
        story.extend(hero.awards.iter().map(|award| {
            Line::from(Span::styled(
                format!("• {award}"),
                Style::default().fg(self.theme.success),
            ))
        }));
        story.push(Line::from(""));
        story.push(Line::from(Span::styled(
            "Временная шкала событий",
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )));
        story.extend(hero.timeline.iter().enumerate().map(|(idx, entry)| {
            Line::from(vec![
                Span::styled(format!("{:>2}. ", idx + 1), Style::default().fg(self.theme.muted)),
                Span::styled(
                    format!("{} ", entry.year),
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(entry.event.clone()),
            ])
        }));
        frame.render_widget(
            Paragraph::new(story)
                .block(Block::default().borders(Borders::ALL))
                .wrap(Wrap { trim: true })
                .scroll((self.state.detail_scroll, 0)),
            body[1],
        );

        self.render_status(frame, chunks[2]);
    }

    fn draw_admin(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(size);

        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                "Админ-панель",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  Всего героев: {}", self.admin.len())),
        ]))
        .block(Block::default().borders(Borders::ALL).title(
            "n добавить · e изменить · d удалить · L выйти · Esc на сайт",
        ));
        frame.render_widget(header, chunks[0]);

        let len = self.admin.len();
        let area = chunks[1];
        self.state.admin_list.height = area.height.saturating_sub(2) as usize;
        self.state.admin_list.clamp(len);
        self.state.admin_list.ensure_visible(len);
        let window = self.state.admin_list.window(len);
        let cursor = self.state.admin_list.cursor;
        let offset = self.state.admin_list.offset;

        let items: Vec<ListItem> = self.admin.heroes()[window]
            .iter()
            .enumerate()
            .map(|(idx, hero)| {
                let marker = if offset + idx == cursor { "▶ " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(self.theme.accent)),
                    Span::styled(
                        hero.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" · {} · {}", hero.rank, hero.period),
                        Style::default().fg(self.theme.muted),
                    ),
                    Span::styled(
                        format!("  [{}]", hero.conflict),
                        Style::default().fg(self.theme.accent_alt),
                    ),
                    Span::styled(
                        format!("  {} наград", hero.awards.len()),
                        Style::default().fg(self.theme.success),
                    ),
                ]))
            })
            .collect();

        let mut list_state = ListState::default();
        if !items.is_empty() {
            list_state.select(Some(cursor.saturating_sub(offset).min(items.len() - 1)));
        }
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Герои"))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);

        self.render_status(frame, chunks[2]);
    }

    fn render_form(&self, frame: &mut Frame) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(90_u16, frame_area.width.saturating_sub(4)), 30);
        let height = frame_area.height.saturating_sub(2).max(10);
        let area = centered_rect(width, height, frame_area);
        frame.render_widget(Clear, area);

        let form = self.admin.form();
        let mut lines = Vec::new();
        let mut focus_line = 0usize;
        for field in FormField::ALL {
            let focused = field == self.focus;
            if focused {
                focus_line = lines.len();
            }
            let label_style = if focused {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted)
            };
            let marker = if focused { "▶ " } else { "  " };
            lines.push(Line::from(Span::styled(
                format!("{marker}{} *", field.label()),
                label_style,
            )));

            let value = form.field(field);
            let mut value_lines: Vec<String> =
                value.split('\n').map(|line| format!("    {line}")).collect();
            if focused {
                if let Some(last) = value_lines.last_mut() {
                    last.push('▌');
                }
            }
            lines.extend(value_lines.into_iter().map(Line::from));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Ctrl-S", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" сохранить  "),
            Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" следующее поле  "),
            Span::styled("Ctrl-U", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" загрузить файл изображения  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" отмена"),
        ]));

        let title = if self.admin.editing().is_some() {
            "Редактировать героя"
        } else {
            "Добавить нового героя"
        };
        let inner_height = area.height.saturating_sub(2) as usize;
        let scroll = focus_line.saturating_sub(inner_height / 3) as u16;
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn render_login_prompt(&self, frame: &mut Frame, prompt: &LoginPrompt) {
        let frame_area = frame.size();
        let mut width = cmp::min(60_u16, frame_area.width.saturating_sub(4));
        width = cmp::max(width, 24_u16);
        let height = 8_u16.min(frame_area.height.saturating_sub(2)).max(5_u16);
        let area = centered_rect(width, height, frame_area);

        frame.render_widget(Clear, area);

        let input_line = Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.accent)),
            Span::raw(prompt.masked()),
        ]);
        let helper = Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" войти  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" вернуться на главную"),
        ]);
        let feedback = if self.pending_login {
            Line::from(Span::styled("Вход…", Style::default().fg(self.theme.muted)))
        } else if let Some(message) = &prompt.error {
            Line::from(Span::styled(
                message.clone(),
                Style::default().fg(self.theme.danger),
            ))
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![
            input_line,
            Line::from(""),
            feedback,
            helper,
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Введите пароль для доступа к админ-панели"),
        )
        .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, area);

        let cursor_x =
            (area.x + 3 + prompt.cursor as u16).min(area.x + area.width.saturating_sub(2));
        let cursor_y = area.y + 1;
        frame.set_cursor(cursor_x, cursor_y);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Статус");
        let primary = if self.state.mode == Mode::Search && self.screen == Screen::Catalogue {
            format!("Поиск: {}", self.catalogue.query())
        } else {
            self.state.status.clone()
        };
        let session = if self.token.is_some() {
            "админ"
        } else {
            "гость"
        };
        let line = Line::from(vec![
            Span::raw(primary),
            Span::styled(
                format!("  ·  {} героев  ·  {session}", self.catalogue.total()),
                Style::default().fg(self.theme.muted),
            ),
        ]);
        let paragraph = Paragraph::new(line).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    list: ListCursor,
    admin_list: ListCursor,
    detail_scroll: u16,
    status: String,
    mode: Mode,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            list: ListCursor::default(),
            admin_list: ListCursor::default(),
            detail_scroll: 0,
            status: "Готово".to_string(),
            mode: Mode::Browse,
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_cursor_scrolls_with_selection() {
        let mut list = ListCursor {
            height: 3,
            ..ListCursor::default()
        };
        list.move_by(4, 10);
        assert_eq!(list.cursor, 4);
        assert_eq!(list.offset, 2);
        assert_eq!(list.window(10), 2..5);

        list.move_to(usize::MAX, 10);
        assert_eq!(list.cursor, 9);
        assert_eq!(list.offset, 7);

        list.page(-1, 10);
        assert_eq!(list.cursor, 6);

        list.clamp(2);
        assert_eq!(list.cursor, 1);
        list.clamp(0);
        assert_eq!((list.cursor, list.offset), (0, 0));
    }

    #[test]
    fn login_prompt_edits_multibyte_text() {
        let mut prompt = LoginPrompt::default();
        for ch in "пароль".chars() {
            prompt.insert(ch);
        }
        prompt.move_cursor(-2);
        prompt.backspace();
        assert_eq!(prompt.input, "парль");
        prompt.move_home();
        prompt.delete();
        assert_eq!(prompt.input, "арль");
        prompt.move_end();
        prompt.insert('!');
        assert_eq!(prompt.input, "арль!");
        assert_eq!(prompt.masked(), "•••••");
    }

    #[test]
    fn centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 40, 10);
        let rect = centered_rect(60, 4, area);
        assert_eq!(rect, Rect::new(0, 3, 40, 4));
    }
}
