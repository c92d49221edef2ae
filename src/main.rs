use eframe::egui;
use egui::{Color32, CornerRadius, RichText, ScrollArea, Stroke, Ui, ViewportBuilder};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use airank_reader::error::AcquireError;
use airank_reader::filters::{ColumnSort, SortDirection, SortKey, ToolFilter};
use airank_reader::format::{format_growth, format_income, format_number, payment_label};
use airank_reader::pagination::{ScrollIntent, ScrollMetrics};
use airank_reader::session::LoadView;
use airank_reader::{
    Acquisition, AcquisitionOrchestrator, AppConfig, DatasetCache, DirFetcher, EmbeddedFallbackProvider,
    Fetcher, HttpFetcher, LoadState, RankingSession, RankingType, SourceKind, Ticket, ToolRecord,
};

type LoadResult = (Ticket, Result<Acquisition, AcquireError>);

// Languages offered in the header toggle
const LANGUAGES: [(&str, &str); 2] = [("en", "EN"), ("zh", "ZH")];

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_line_number(true)
        .compact()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    tracing::info!(
        base_url = %config.base_url,
        data_dir = ?config.data_dir,
        language = %config.language,
        "starting AI Rank Reader"
    );

    let fetcher: Arc<dyn Fetcher> = match &config.data_dir {
        Some(dir) => Arc::new(DirFetcher::new(dir.clone())),
        None => {
            let base = reqwest::Url::parse(&config.base_url)
                .with_context(|| format!("invalid base_url '{}'", config.base_url))?;
            Arc::new(HttpFetcher::new(base, config.request_timeout()))
        }
    };

    let orchestrator = Arc::new(AcquisitionOrchestrator::new(
        fetcher,
        config.path_resolver(),
        Arc::new(DatasetCache::with_system_clock(config.cache_ttl())),
        EmbeddedFallbackProvider::new(),
    ));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("AI Rank Reader"),
        ..Default::default()
    };

    eframe::run_native(
        "AI Rank Reader",
        options,
        Box::new(move |cc| {
            let mut app = RankReaderApp::new(runtime, orchestrator, &config);

            // Restore the last session's preferences
            if let Some(storage) = cc.storage {
                if let Some(dark) = storage.get_string("is_dark_mode").and_then(|s| s.parse::<bool>().ok()) {
                    app.set_dark_mode(dark);
                }
                if let Some(language) = storage.get_string("language") {
                    app.language = language;
                }
                if let Some(ranking) = storage
                    .get_string("ranking_type")
                    .and_then(|s| s.parse::<RankingType>().ok())
                {
                    app.ranking = ranking;
                }
                if let Some(region) = storage.get_string("region") {
                    app.session.select_region(&region);
                }
            }

            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("UI exited with an error: {e}"))
}

struct AppTheme {
    background: Color32,
    card_background: Color32,
    text: Color32,
    secondary_text: Color32,
    highlight: Color32,
    separator: Color32,
    growth_up: Color32,
    growth_down: Color32,
    warning: Color32,
    error: Color32,
    button_background: Color32,
    button_foreground: Color32,
    button_hover_background: Color32,
}

impl AppTheme {
    fn dark() -> Self {
        Self {
            background: Color32::from_rgb(18, 18, 18),
            card_background: Color32::from_rgb(30, 30, 30),
            text: Color32::from_rgb(240, 240, 240),
            secondary_text: Color32::from_rgb(170, 170, 170),
            highlight: Color32::from_rgb(124, 92, 255),
            separator: Color32::from_rgb(60, 60, 60),
            growth_up: Color32::from_rgb(76, 175, 80),
            growth_down: Color32::from_rgb(239, 83, 80),
            warning: Color32::from_rgb(255, 193, 7),
            error: Color32::from_rgb(239, 83, 80),
            button_background: Color32::from_rgb(66, 66, 66),
            button_foreground: Color32::from_rgb(240, 240, 240),
            button_hover_background: Color32::from_rgb(80, 80, 80),
        }
    }

    fn light() -> Self {
        Self {
            background: Color32::from_rgb(245, 245, 245),
            card_background: Color32::from_rgb(255, 255, 255),
            text: Color32::from_rgb(20, 20, 20),
            secondary_text: Color32::from_rgb(90, 90, 90),
            highlight: Color32::from_rgb(98, 64, 230),
            separator: Color32::from_rgb(200, 200, 200),
            growth_up: Color32::from_rgb(30, 110, 40),
            growth_down: Color32::from_rgb(190, 40, 40),
            warning: Color32::from_rgb(190, 130, 0),
            error: Color32::from_rgb(190, 40, 40),
            button_background: Color32::from_rgb(235, 235, 235),
            button_foreground: Color32::from_rgb(20, 20, 20),
            button_hover_background: Color32::from_rgb(210, 210, 210),
        }
    }

    fn apply_to_ctx(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        style.visuals.panel_fill = self.background;
        style.visuals.window_fill = self.card_background;
        style.visuals.window_stroke = Stroke::new(1.0, self.separator);
        style.visuals.widgets.noninteractive.bg_fill = self.card_background;
        style.visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text);

        style.visuals.widgets.inactive.bg_fill = self.button_background;
        style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.hovered.bg_fill = self.button_hover_background;
        style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.active.bg_fill = self.highlight;

        style.visuals.selection.bg_fill = self.highlight;
        style.visuals.selection.stroke = Stroke::new(1.0, self.highlight);

        style.visuals.window_corner_radius = CornerRadius::same(8);
        style.visuals.widgets.inactive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.hovered.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.active.corner_radius = CornerRadius::same(4);

        ctx.set_style(style);
    }

    fn growth_color(&self, growth: f64) -> Color32 {
        if growth > 0.0 {
            self.growth_up
        } else if growth < 0.0 {
            self.growth_down
        } else {
            self.secondary_text
        }
    }
}

struct RankReaderApp {
    runtime: tokio::runtime::Runtime,
    orchestrator: Arc<AcquisitionOrchestrator>,
    session: RankingSession,
    // Results come back from runtime tasks tagged with the ticket they were started under
    results_tx: Sender<LoadResult>,
    results_rx: Receiver<LoadResult>,
    // Requested context; the session follows it on the next load
    language: String,
    ranking: RankingType,
    theme: AppTheme,
    is_dark_mode: bool,
    search_query: String,
    selected_tag: Option<String>,
    column_sort: ColumnSort,
    scroll_intent: ScrollIntent,
    scroll_to_top: bool,
    first_frame: bool,
}

impl RankReaderApp {
    fn new(
        runtime: tokio::runtime::Runtime,
        orchestrator: Arc<AcquisitionOrchestrator>,
        config: &AppConfig,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::channel();
        Self {
            runtime,
            orchestrator,
            session: RankingSession::new(
                config.language.clone(),
                config.ranking_type,
                &config.default_region,
                config.page_size,
            ),
            results_tx,
            results_rx,
            language: config.language.clone(),
            ranking: config.ranking_type,
            theme: AppTheme::dark(),
            is_dark_mode: true,
            search_query: String::new(),
            selected_tag: None,
            column_sort: ColumnSort::default(),
            scroll_intent: ScrollIntent::new(config.scroll_debounce()),
            scroll_to_top: true,
            first_frame: true,
        }
    }

    fn set_dark_mode(&mut self, dark: bool) {
        self.is_dark_mode = dark;
        self.theme = if dark { AppTheme::dark() } else { AppTheme::light() };
    }

    /// Starts an acquisition for the requested context on the runtime.
    fn load(&mut self, ctx: &egui::Context) {
        let ticket = self.session.begin_load(&self.language, self.ranking, None);
        self.spawn_acquire(ticket, ctx);
    }

    fn retry(&mut self, ctx: &egui::Context) {
        let ticket = self.session.retry();
        self.spawn_acquire(ticket, ctx);
    }

    fn spawn_acquire(&mut self, ticket: Ticket, ctx: &egui::Context) {
        let orchestrator = Arc::clone(&self.orchestrator);
        let tx = self.results_tx.clone();
        let ctx = ctx.clone();
        let language = self.language.clone();
        let ranking = self.ranking;

        self.scroll_intent.clear();
        self.scroll_to_top = true;

        self.runtime.spawn(async move {
            let result = orchestrator.acquire(&language, ranking, &ticket).await;
            // The receiver only goes away when the window closes
            let _ = tx.send((ticket, result));
            ctx.request_repaint();
        });
    }

    fn check_results(&mut self) {
        while let Ok((ticket, result)) = self.results_rx.try_recv() {
            if self.session.apply(&ticket, result) {
                tracing::debug!(state = ?self.session.state(), "load applied");
            }
        }
    }

    fn switch_ranking(&mut self, ranking: RankingType, ctx: &egui::Context) {
        if self.ranking != ranking {
            self.ranking = ranking;
            self.reset_filter();
            self.load(ctx);
        }
    }

    fn switch_language(&mut self, language: &str, ctx: &egui::Context) {
        if self.language != language {
            self.language = language.to_string();
            self.reset_filter();
            self.load(ctx);
        }
    }

    fn select_region(&mut self, code: &str) {
        self.session.select_region(code);
        self.scroll_intent.clear();
        self.scroll_to_top = true;
    }

    fn reset_filter(&mut self) {
        self.search_query.clear();
        self.selected_tag = None;
        self.session.set_filter(ToolFilter::default());
    }

    fn apply_filter(&mut self) {
        self.session.set_filter(ToolFilter {
            search: self.search_query.clone(),
            tags: self.selected_tag.iter().cloned().collect(),
        });
        self.scroll_intent.clear();
        self.scroll_to_top = true;
    }

    fn open_link(&self, url: &str) {
        if let Err(e) = open::that(url) {
            tracing::warn!(url, error = %e, "failed to open URL");
        }
    }

    fn render_header(&mut self, ui: &mut Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            ui.label(
                RichText::new("AI Rank")
                    .color(self.theme.highlight)
                    .size(22.0)
                    .strong(),
            );
            ui.add_space(16.0);

            for ranking in RankingType::ALL {
                let selected = self.ranking == ranking;
                let text = if selected {
                    RichText::new(ranking.label()).size(16.0).color(self.theme.highlight).strong()
                } else {
                    RichText::new(ranking.label()).size(16.0).color(self.theme.secondary_text)
                };
                let button = egui::Button::new(text)
                    .fill(if selected { self.theme.card_background } else { Color32::TRANSPARENT })
                    .stroke(if selected {
                        Stroke::new(2.0, self.theme.highlight)
                    } else {
                        Stroke::NONE
                    });
                if ui.add_sized([90.0, 32.0], button).clicked() {
                    self.switch_ranking(ranking, ctx);
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let theme_icon = if self.is_dark_mode { "☀" } else { "🌙" };
                if ui.button(theme_icon).on_hover_text("Toggle theme").clicked() {
                    self.set_dark_mode(!self.is_dark_mode);
                }

                for (code, label) in LANGUAGES.iter().rev() {
                    if ui.selectable_label(self.language == *code, *label).clicked() {
                        self.switch_language(code, ctx);
                    }
                }
            });
        });
    }

    fn render_toolbar(&mut self, ui: &mut Ui) {
        let mut filter_changed = false;
        let mut region_choice = None;

        ui.horizontal(|ui| {
            ui.label(RichText::new("Search").color(self.theme.secondary_text));
            let search = ui.add(
                egui::TextEdit::singleline(&mut self.search_query)
                    .hint_text("name or description")
                    .desired_width(220.0),
            );
            filter_changed |= search.changed();

            ui.add_space(12.0);
            let tags = self.session.tags();
            egui::ComboBox::from_id_salt("tag_filter")
                .selected_text(self.selected_tag.as_deref().unwrap_or("All tags"))
                .show_ui(ui, |ui| {
                    filter_changed |= ui.selectable_value(&mut self.selected_tag, None, "All tags").changed();
                    for tag in tags {
                        let label = tag.clone();
                        filter_changed |= ui
                            .selectable_value(&mut self.selected_tag, Some(tag), label)
                            .changed();
                    }
                });

            if self.ranking.is_regional() {
                ui.add_space(12.0);
                ui.label(RichText::new("Region").color(self.theme.secondary_text));
                let current = self.session.region().to_string();
                let mut regions = self.session.regions();
                if !regions.contains(&current) {
                    regions.insert(0, current.clone());
                }
                egui::ComboBox::from_id_salt("region_select")
                    .selected_text(current.as_str())
                    .show_ui(ui, |ui| {
                        for code in regions {
                            if ui.selectable_label(code == current, code.as_str()).clicked() {
                                region_choice = Some(code);
                            }
                        }
                    });
            }
        });

        if filter_changed {
            self.apply_filter();
        }
        if let Some(code) = region_choice {
            self.select_region(&code);
        }
    }

    // Notices above the table: embedded data, failures, empty regions
    fn render_status(&mut self, ui: &mut Ui, view: &LoadView, ctx: &egui::Context) {
        let mut retry = false;

        match view.state {
            LoadState::ReadyWithDiagnostics => {
                let message = if view.fallback_of_last_resort {
                    format!(
                        "No data for {} / {}. Showing the built-in English monthly ranking instead.",
                        self.language,
                        self.ranking.label()
                    )
                } else {
                    "Network data unavailable. Showing built-in data.".to_string()
                };
                ui.horizontal(|ui| {
                    ui.label(RichText::new(message).color(self.theme.warning));
                    retry = ui.button("Retry").clicked();
                });
                render_attempted_paths(ui, &view.attempted_paths, &self.theme);
            }
            LoadState::Failed => {
                egui::Frame::new()
                    .fill(self.theme.card_background)
                    .stroke(Stroke::new(1.0, self.theme.error))
                    .corner_radius(CornerRadius::same(8))
                    .inner_margin(12.0)
                    .show(ui, |ui| {
                        if let Some(failure) = &view.error {
                            ui.label(RichText::new(&failure.message).color(self.theme.error).strong());
                            ui.label(
                                RichText::new(format!(
                                    "{} / {} from {}",
                                    failure.language, failure.ranking, failure.base
                                ))
                                .color(self.theme.secondary_text),
                            );
                        }
                        render_attempted_paths(ui, &view.attempted_paths, &self.theme);
                        retry = ui.button("Retry").clicked();
                    });
            }
            _ if view.region_empty => {
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.label(
                        RichText::new(format!(
                            "No data for region {}",
                            view.region.as_deref().unwrap_or_default()
                        ))
                        .color(self.theme.secondary_text)
                        .size(18.0)
                        .italics(),
                    );
                    ui.add_space(8.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            _ => {}
        }

        if retry {
            self.retry(ctx);
        }
    }

    fn render_table(&mut self, ui: &mut Ui, rows: &[ToolRecord]) {
        let mut sort_click = None;
        let mut link_click = None;
        let language = self.language.clone();
        let regional = self.ranking.is_regional();

        egui::Grid::new("tools_grid")
            .striped(true)
            .num_columns(7)
            .spacing([16.0, 8.0])
            .show(ui, |ui| {
                let visits_header = if regional { "Region visits" } else { "Visits" };
                for (key, label) in [
                    (SortKey::Rank, "#"),
                    (SortKey::Name, "Tool"),
                    (SortKey::MonthlyVisits, visits_header),
                    (SortKey::GrowthRate, "Growth"),
                    (SortKey::TopRegion, "Top region"),
                    (SortKey::EstimatedIncome, "Income"),
                    (SortKey::PaymentPlatform, "Payment"),
                ] {
                    let marker = match (self.column_sort.key == key, self.column_sort.direction) {
                        (true, SortDirection::Asc) => " ▲",
                        (true, SortDirection::Desc) => " ▼",
                        (false, _) => "",
                    };
                    let header = RichText::new(format!("{label}{marker}"))
                        .color(self.theme.secondary_text)
                        .strong();
                    if ui.add(egui::Label::new(header).sense(egui::Sense::click())).clicked() {
                        sort_click = Some(key);
                    }
                }
                ui.end_row();

                for record in rows {
                    ui.label(RichText::new(record.rank.to_string()).color(self.theme.secondary_text));

                    let name = ui
                        .add(
                            egui::Label::new(RichText::new(&record.name).color(self.theme.text).strong())
                                .sense(egui::Sense::click()),
                        )
                        .on_hover_text(format!("{}\n{}", record.description, record.logo_or_avatar()));
                    if name.clicked() && !record.url.is_empty() {
                        link_click = Some(record.url.clone());
                    }

                    let visits = if regional {
                        record.region_monthly_visits.unwrap_or(record.monthly_visits)
                    } else if self.ranking == RankingType::Total {
                        record.top_visits
                    } else {
                        record.monthly_visits
                    };
                    ui.label(format_number(visits, &language));

                    ui.label(
                        RichText::new(format_growth(record.growth, record.growth_rate, &language))
                            .color(self.theme.growth_color(record.growth)),
                    );
                    ui.label(record.top_region.as_deref().unwrap_or("-"));
                    ui.label(format_income(record.estimated_income));
                    ui.label(payment_label(record.payment_platforms.as_ref()));
                    ui.end_row();
                }
            });

        if let Some(key) = sort_click {
            self.column_sort.toggle(key);
        }
        if let Some(url) = link_click {
            self.open_link(&url);
        }
    }

    fn render_footer(&self, ui: &mut Ui, view: &LoadView) {
        ui.horizontal(|ui| {
            if let Some(metadata) = &view.metadata {
                ui.label(
                    RichText::new(format!(
                        "Updated {}",
                        metadata.last_updated.format("%Y-%m-%d %H:%M UTC")
                    ))
                    .color(self.theme.secondary_text),
                );
            }
            if let Some(source) = view.source {
                let color = if view.origin == Some(SourceKind::Embedded) {
                    self.theme.warning
                } else {
                    self.theme.secondary_text
                };
                ui.label(RichText::new(format!("source: {source}")).color(color));
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let window = self.session.window();
                ui.label(
                    RichText::new(format!(
                        "{} of {}",
                        window.revealed_count().min(window.partition_len()),
                        window.partition_len()
                    ))
                    .color(self.theme.secondary_text),
                );
            });
        });
    }
}

fn render_attempted_paths(ui: &mut Ui, paths: &[String], theme: &AppTheme) {
    if paths.is_empty() {
        return;
    }
    egui::CollapsingHeader::new(format!("Tried {} paths", paths.len()))
        .id_salt("attempted_paths")
        .show(ui, |ui| {
            for path in paths {
                ui.label(RichText::new(path).monospace().color(theme.secondary_text));
            }
        });
}

impl eframe::App for RankReaderApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        storage.set_string("is_dark_mode", self.is_dark_mode.to_string());
        storage.set_string("language", self.language.clone());
        storage.set_string("ranking_type", self.ranking.as_str().to_string());
        storage.set_string("region", self.session.region().to_string());
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.theme.apply_to_ctx(ctx);
        self.check_results();

        if self.first_frame {
            self.first_frame = false;
            self.load(ctx);
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(6.0);
            self.render_header(ui, ctx);
            ui.add_space(4.0);
            self.render_toolbar(ui);
            ui.add_space(6.0);
        });

        let view = self.session.view();

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            self.render_footer(ui, &view);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_status(ui, &view, ctx);

            if view.loading && view.records.is_empty() {
                ui.vertical_centered(|ui| {
                    ui.add_space(40.0);
                    ui.spinner();
                    ui.label(RichText::new("Loading rankings...").color(self.theme.secondary_text));
                });
                return;
            }

            let mut rows = view.records.clone();
            self.column_sort.sort_revealed(&mut rows);

            let mut scroll = ScrollArea::vertical()
                .id_salt("tools_scroll_area")
                .auto_shrink([false, false]);
            if self.scroll_to_top {
                scroll = scroll.vertical_scroll_offset(0.0);
                self.scroll_to_top = false;
            }

            let output = scroll.show(ui, |ui| {
                self.render_table(ui, &rows);

                if view.has_more {
                    ui.add_space(10.0);
                    ui.vertical_centered(|ui| {
                        ui.label(RichText::new("Scroll for more").color(self.theme.secondary_text));
                    });
                } else if !rows.is_empty() {
                    ui.add_space(10.0);
                    ui.vertical_centered(|ui| {
                        ui.label(RichText::new("End of list.").color(self.theme.secondary_text));
                    });
                }
                ui.add_space(20.0);
            });

            let metrics = ScrollMetrics {
                offset: output.state.offset.y,
                viewport: output.inner_rect.height(),
                content: output.content_size.y,
            };
            if self.session.has_more() && self.scroll_intent.observe(metrics, Instant::now()) {
                let revealed = self.session.load_more();
                tracing::debug!(revealed, "revealed next page");
                ctx.request_repaint();
            }
        });
    }
}
