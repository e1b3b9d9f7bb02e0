use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use flappylearn::machine_learning::reinforcement_learning::rl_model::RLModel;
use ratatui::{
    layout::{Constraint, Layout},
    Frame,
};
use tracing::info;

use super::{
    engine::Engine,
    error::{FlappyError, Result},
    game_model::GameManager,
    info::TrainingInfo,
    input::GameInput,
    trainer::{Curriculum, CurriculumTrainer, EpisodeReport},
};

/// Runs the curriculum on a worker thread and shows the last finished episode next to the
/// training statistics.
pub struct TrainingEngine {
    trainer_handle: Option<thread::JoinHandle<Result<()>>>,
    latest_game: Arc<Mutex<Option<GameManager>>>,
    main_to_trainer_sender: Sender<GameInput>,
    report_receiver: Receiver<EpisodeReport>,
    visual_game: Option<GameManager>,
    visual_info: TrainingInfo,
}

impl TrainingEngine {
    pub fn new<M: RLModel + Send + 'static>(
        mut trainer: CurriculumTrainer<M>,
        curriculum: Curriculum,
        save_model: Option<PathBuf>,
    ) -> Self {
        let (main_to_trainer_sender, main_to_trainer_receiver) = mpsc::channel();
        let (report_sender, report_receiver) = mpsc::channel();
        let latest_game = Arc::new(Mutex::new(None));
        let latest_game_sender = Arc::clone(&latest_game);
        let visual_info = TrainingInfo::new(curriculum.total_episodes());

        let episode_hook = move |report: &EpisodeReport, game: &GameManager| -> bool {
            if let Ok(mut latest) = latest_game_sender.lock() {
                *latest = Some(game.clone());
            }
            let _ = report_sender.send(report.clone());
            matches!(main_to_trainer_receiver.try_recv(), Ok(GameInput::Quit))
        };

        let trainer_handle = thread::spawn(move || -> Result<()> {
            trainer.run(&curriculum, episode_hook)?;
            if let Some(path) = save_model {
                trainer.save_model(&path)?;
            }
            Ok(())
        });

        Self {
            trainer_handle: Some(trainer_handle),
            latest_game,
            main_to_trainer_sender,
            report_receiver,
            visual_game: None,
            visual_info,
        }
    }

    fn join_trainer(&mut self) -> Result<()> {
        match self.trainer_handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| FlappyError::TrainingPanicked)?,
            None => Ok(()),
        }
    }
}

impl Engine for TrainingEngine {
    fn tick(&mut self, user_input: Option<GameInput>) -> Result<bool> {
        if let Some(GameInput::Quit) = user_input {
            if self.trainer_handle.is_some() {
                info!("Stopping training");
                let _ = self.main_to_trainer_sender.send(GameInput::Quit);
            }
            self.join_trainer()?;
            return Ok(true);
        }
        if let Ok(mut latest) = self.latest_game.lock() {
            if let Some(game) = latest.take() {
                self.visual_game = Some(game);
            }
        }
        while let Ok(report) = self.report_receiver.try_recv() {
            self.visual_info.add_report(&report);
        }
        let finished = self
            .trainer_handle
            .as_ref()
            .is_some_and(|handle| handle.is_finished());
        if finished {
            self.join_trainer()?;
            self.visual_info.set_finished();
        }
        Ok(false)
    }

    fn render_frame(&self, frame: &mut Frame) {
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(frame.size());
        if let Some(game) = self.visual_game.as_ref() {
            frame.render_widget(game, left);
        }
        frame.render_widget(&self.visual_info, right);
    }
}
