// info.rs

use std::time::Instant;

use ratatui::{prelude::*, text::Span, widgets::*};

use ratatui::{
    style::Color,
    widgets::{Block, Borders, Chart, Dataset, Widget},
};

use ratatui::{buffer::Buffer, layout::Rect, style::Style, symbols};

use super::trainer::EpisodeReport;

/// Episodes averaged into one point of the score chart.
const SCORE_WINDOW: usize = 10;

#[derive(Clone, Debug)]
pub struct TrainingInfo {
    stage: String,
    stage_episode: usize,
    episodes_done: usize,
    total_episodes: usize,
    learning_rate: f32,
    exploration_rate: f32,
    best_score: u32,
    pending_scores: Vec<u32>,
    score_average: Vec<(f64, f64)>,
    loss_history: Vec<(f64, f64)>,
    start_time: Instant,
    eta: Option<(u64, u64)>,
    finished: bool,
}

impl TrainingInfo {
    pub fn new(total_episodes: usize) -> TrainingInfo {
        TrainingInfo {
            stage: "-".to_string(),
            stage_episode: 0,
            episodes_done: 0,
            total_episodes,
            learning_rate: 0.0,
            exploration_rate: 0.0,
            best_score: 0,
            pending_scores: Vec::new(),
            score_average: Vec::new(),
            loss_history: Vec::new(),
            start_time: Instant::now(),
            eta: None,
            finished: false,
        }
    }

    pub fn add_report(&mut self, report: &EpisodeReport) {
        self.episodes_done += 1;
        self.total_episodes = report.total_episodes;
        self.stage = report.record.stage.clone();
        self.stage_episode = report.record.episode;
        self.learning_rate = report.learning_rate;
        self.exploration_rate = report.record.exploration_rate;
        self.best_score = self.best_score.max(report.record.score);
        if let Some(loss) = report.mean_loss {
            self.loss_history
                .push((self.episodes_done as f64, loss as f64));
        }
        self.pending_scores.push(report.record.score);
        if self.pending_scores.len() >= SCORE_WINDOW {
            let sum = self.pending_scores.drain(..).sum::<u32>();
            self.score_average
                .push((self.episodes_done as f64, sum as f64 / SCORE_WINDOW as f64));
        }
        let elapsed_time = self.start_time.elapsed().as_secs_f64();
        let estimated =
            (elapsed_time / self.episodes_done as f64) * self.total_episodes as f64;
        let eta = (estimated - elapsed_time).max(0.0) as u64;
        self.eta = Some((eta / 3600, (eta % 3600) / 60));
    }

    pub fn set_finished(&mut self) {
        self.finished = true;
        self.eta = Some((0, 0));
    }

    #[cfg(test)]
    pub fn episodes_done(&self) -> usize {
        self.episodes_done
    }

    #[cfg(test)]
    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    #[cfg(test)]
    pub fn score_average(&self) -> &[(f64, f64)] {
        &self.score_average
    }

    fn max_average_score(&self) -> f64 {
        self.score_average
            .iter()
            .map(|(_, score)| *score)
            .fold(1.0, f64::max)
    }

    fn max_loss(&self) -> f64 {
        self.loss_history
            .iter()
            .map(|(_, loss)| *loss)
            .fold(f64::EPSILON, f64::max)
    }
}

impl Widget for TrainingInfo {
    fn render(self, area: ratatui::prelude::Rect, buf: &mut ratatui::prelude::Buffer)
    where
        Self: Sized,
    {
        self.render_ref(area, buf)
    }
}

impl WidgetRef for TrainingInfo {
    fn render_ref(&self, info_area: Rect, buf: &mut Buffer) {
        let [up, down] = Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(info_area);
        let block = Block::default()
            .title(format!("Average score ({SCORE_WINDOW})"))
            .title_alignment(Alignment::Left)
            .borders(Borders::ALL);
        block.render(up, buf);
        if let Some((_, current)) = self.score_average.last() {
            let max_score = self.max_average_score();
            let datasets = vec![Dataset::default()
                .name(format!("Current: {current:.2}"))
                .marker(symbols::Marker::Dot)
                .style(Style::default().fg(Color::LightBlue))
                .data(&self.score_average)];
            let chart = Chart::new(datasets)
                .block(
                    Block::bordered().title(Span::styled(
                        "Scores",
                        Style::default()
                            .fg(Color::LightBlue)
                            .add_modifier(Modifier::BOLD),
                    )),
                )
                .x_axis(
                    Axis::default()
                        .title("Episode")
                        .style(Style::default().fg(Color::Gray))
                        .bounds([0.0, self.episodes_done as f64])
                        .labels(vec![
                            Span::styled("0", Style::default().add_modifier(Modifier::BOLD)),
                            Span::styled(
                                format!("{}", self.episodes_done),
                                Style::default().add_modifier(Modifier::BOLD),
                            ),
                        ]),
                )
                .y_axis(
                    Axis::default()
                        .title("Score")
                        .style(Style::default().fg(Color::Gray))
                        .bounds([0.0, max_score])
                        .labels(vec![
                            Span::raw("0.0"),
                            Span::styled(
                                format!("{max_score:.1}"),
                                Style::default().add_modifier(Modifier::BOLD),
                            ),
                        ]),
                );

            chart.render(up, buf);
        }

        let [left, right] =
            Layout::horizontal([Constraint::Percentage(30), Constraint::Percentage(70)])
                .areas(down);
        let status = if self.finished {
            "Training finished, press q to quit".to_string()
        } else {
            format!("Stage: {} (episode {})", self.stage, self.stage_episode)
        };
        let duration = self.start_time.elapsed();
        let elapsed_hours = duration.as_secs() / 3600;
        let elapsed_minutes = (duration.as_secs() % 3600) / 60;
        let eta_h_min = if let Some(eta) = self.eta {
            format!("Eta: {:?} h {:?} mins", eta.0, eta.1)
        } else {
            "-".to_string()
        };
        let lines = vec![
            Line::from(status),
            Line::from(format!(
                "Episodes: {}/{}",
                self.episodes_done, self.total_episodes
            )),
            Line::from(format!("Best score: {}", self.best_score)),
            Line::from(format!("Learning rate: {}", self.learning_rate)),
            Line::from(format!("Exploration rate: {:.4}", self.exploration_rate)),
            Line::from(format!(
                "Elapsed time: {:?} h {:?} mins",
                elapsed_hours, elapsed_minutes
            )),
            Line::from(eta_h_min),
        ];
        let text = Text::from(
            lines
                .into_iter()
                .map(|line| line.alignment(Alignment::Left))
                .collect::<Vec<_>>(),
        );
        let block = Paragraph::new(text).block(Block::bordered().title_top("Info"));
        block.render(left, buf);

        let block = Block::default()
            .title("Loss History")
            .title_alignment(Alignment::Left)
            .borders(Borders::ALL);
        block.render(right, buf);

        if let Some((_, current)) = self.loss_history.last() {
            let max_loss = self.max_loss();
            let datasets = vec![Dataset::default()
                .name(format!("Current: {current:.5}"))
                .marker(symbols::Marker::Dot)
                .style(Style::default().fg(Color::LightRed))
                .data(&self.loss_history)];
            let chart = Chart::new(datasets)
                .block(
                    Block::bordered().title(Span::styled(
                        "Loss History",
                        Style::default()
                            .fg(Color::LightRed)
                            .add_modifier(Modifier::BOLD),
                    )),
                )
                .x_axis(
                    Axis::default()
                        .title("Episode")
                        .style(Style::default().fg(Color::Gray))
                        .bounds([0.0, self.episodes_done as f64])
                        .labels(vec![
                            Span::styled("0", Style::default().add_modifier(Modifier::BOLD)),
                            Span::styled(
                                format!("{}", self.episodes_done),
                                Style::default().add_modifier(Modifier::BOLD),
                            ),
                        ]),
                )
                .y_axis(
                    Axis::default()
                        .title("Loss")
                        .style(Style::default().fg(Color::Gray))
                        .bounds([0.0, max_loss])
                        .labels(vec![
                            Span::styled(
                                format!("{:.1}", 0.0),
                                Style::default().add_modifier(Modifier::BOLD),
                            ),
                            Span::styled(
                                format!("{max_loss:.3}"),
                                Style::default().add_modifier(Modifier::BOLD),
                            ),
                        ]),
                );

            chart.render(right, buf);
        }
    }
}
