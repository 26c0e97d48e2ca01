//! The story reader - a [`StorySession`] wired to its collaborators.
//!
//! Navigation decides; the reader only reacts. Every announcement, sound and
//! narration is emitted after the transition has been applied, and none of
//! their failures reach the caller.

use std::sync::Arc;
use story_content::{Choice, Story, TextSimplifier};

use crate::config::ReaderConfig;
use crate::effects::{
    swallow, AchievementTracker, Announcer, LogAnnouncer, LogSoundPlayer, Narrator, NoAchievements,
    SilentSpeech, SoundPlayer, Speech,
};
use crate::errors::BrokenLinkError;
use crate::images::ImageResolver;
use crate::navigation::{Actions, NavigationState, StorySession, Transition};

/// Sounds every story uses, preloaded when a story opens.
pub const COMMON_SOUNDS: &[(&str, &str)] = &[
    ("page-turn", "/sounds/common/page-turn.mp3"),
    ("page-turn-back", "/sounds/common/page-turn-back.mp3"),
    ("choice", "/sounds/common/choice.mp3"),
    ("complete", "/sounds/common/success.mp3"),
    ("click", "/sounds/common/click.mp3"),
];

pub const MISSING_PAGE_MESSAGE: &str = "Sorry, that part of the story is not available yet.";
pub const COMPLETION_MESSAGE: &str = "Story complete! Great job reading!";
pub const BACK_MESSAGE: &str = "Going back to previous page";
const PROGRESS_LABEL: &str = "Story";

/// What a move sounds like before the new page is entered.
#[derive(Debug, Clone, Copy)]
enum Cue<'a> {
    PageTurn,
    Choice(&'a Choice),
    Back,
}

/// Everything the reader notifies.
#[derive(Clone)]
pub struct Collaborators {
    pub announcer: Arc<dyn Announcer>,
    pub sounds: Arc<dyn SoundPlayer>,
    pub achievements: Arc<dyn AchievementTracker>,
    pub speech: Arc<dyn Speech>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            announcer: Arc::new(LogAnnouncer),
            sounds: Arc::new(LogSoundPlayer),
            achievements: Arc::new(NoAchievements),
            speech: Arc::new(SilentSpeech),
        }
    }
}

impl Collaborators {
    pub fn with_announcer(mut self, announcer: Arc<dyn Announcer>) -> Self {
        self.announcer = announcer;
        self
    }

    pub fn with_sounds(mut self, sounds: Arc<dyn SoundPlayer>) -> Self {
        self.sounds = sounds;
        self
    }

    pub fn with_achievements(mut self, achievements: Arc<dyn AchievementTracker>) -> Self {
        self.achievements = achievements;
        self
    }

    pub fn with_speech(mut self, speech: Arc<dyn Speech>) -> Self {
        self.speech = speech;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

pub struct StoryReader {
    session: StorySession,
    announcer: Arc<dyn Announcer>,
    sounds: Arc<dyn SoundPlayer>,
    achievements: Arc<dyn AchievementTracker>,
    narrator: Narrator,
    read_aloud: bool,
    simplified_text: bool,
}

impl std::fmt::Debug for StoryReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryReader")
            .field("session", &self.session)
            .field("narrator", &self.narrator)
            .field("read_aloud", &self.read_aloud)
            .field("simplified_text", &self.simplified_text)
            .finish_non_exhaustive()
    }
}

impl StoryReader {
    /// Open `story` and emit the opening effects.
    ///
    /// A missing or pageless story gives a reader in the NotFound state that
    /// emits nothing.
    pub fn open(story: Option<Arc<Story>>, collaborators: Collaborators, config: &ReaderConfig) -> Self {
        let reader = Self {
            session: StorySession::open(story),
            announcer: collaborators.announcer,
            sounds: collaborators.sounds,
            achievements: collaborators.achievements,
            narrator: Narrator::new(collaborators.speech, config.speech_timeout),
            read_aloud: false,
            simplified_text: false,
        };

        if let (Some(story), Some(index)) = (reader.session.story(), reader.session.page_index()) {
            reader.announce(&format!(
                "Starting story: {}. Use arrow keys to navigate between pages.",
                story.title
            ));
            for (id, url) in COMMON_SOUNDS {
                swallow("sound load", reader.sounds.load(id, url));
            }
            reader.enter_page(index);
        }

        reader
    }

    pub fn session(&self) -> &StorySession {
        &self.session
    }

    pub fn state(&self) -> &NavigationState {
        self.session.state()
    }

    pub fn actions(&self) -> Actions<'_> {
        self.session.actions()
    }

    pub fn is_read_aloud(&self) -> bool {
        self.read_aloud
    }

    pub fn is_simplified_text(&self) -> bool {
        self.simplified_text
    }

    pub fn advance(&mut self) -> Transition {
        let transition = self.session.advance();
        self.react(transition, Cue::PageTurn);
        transition
    }

    pub fn select_choice(&mut self, choice: &Choice) -> Result<Transition, BrokenLinkError> {
        match self.session.select_choice(choice) {
            Ok(transition) => {
                self.react(transition, Cue::Choice(choice));
                Ok(transition)
            }
            Err(err) => {
                self.announce(MISSING_PAGE_MESSAGE);
                self.play("click");
                Err(err)
            }
        }
    }

    /// Select the current page's choice at `choice_index`. Out of range is a no-op.
    pub fn select_choice_at(&mut self, choice_index: usize) -> Result<Transition, BrokenLinkError> {
        let choice = self
            .session
            .current_page()
            .and_then(|page| page.choices.get(choice_index))
            .cloned();

        match choice {
            Some(choice) => self.select_choice(&choice),
            None => Ok(Transition::Unchanged),
        }
    }

    pub fn go_back(&mut self) -> Transition {
        let transition = self.session.go_back();
        self.react(transition, Cue::Back);
        transition
    }

    /// Finish the story right away.
    pub fn complete(&mut self) -> Transition {
        let transition = self.session.complete();
        self.react(transition, Cue::PageTurn);
        transition
    }

    /// The current page text as it should be displayed.
    pub fn display_text(&self) -> Option<String> {
        let text = &self.session.current_page()?.text;
        Some(if self.simplified_text {
            TextSimplifier::standard().simplify(text)
        } else {
            text.clone()
        })
    }

    /// The resolved URL of the current page's illustration.
    pub fn current_illustration(&self, resolver: &ImageResolver) -> Option<String> {
        let image = self.session.current_page()?.image.as_deref()?;
        Some(resolver.resolve(image))
    }

    /// Switch read-aloud on or off, returning the new setting.
    ///
    /// Switching on narrates the current page; switching off stops narration.
    pub fn toggle_read_aloud(&mut self) -> bool {
        self.read_aloud = !self.read_aloud;
        if self.read_aloud {
            self.narrate_current();
        } else {
            self.narrator.stop();
        }
        self.read_aloud
    }

    /// Switch between full and simplified text, returning whether simplified text is now shown.
    pub fn toggle_simplified_text(&mut self) -> bool {
        self.play("click");
        self.simplified_text = !self.simplified_text;
        self.announce(if self.simplified_text {
            "Showing simplified text"
        } else {
            "Showing full text"
        });
        if self.read_aloud {
            self.narrate_current();
        }
        self.simplified_text
    }

    fn react(&self, transition: Transition, cue: Cue<'_>) {
        match transition {
            Transition::Entered { page_index, .. } => {
                match cue {
                    Cue::PageTurn => self.play("page-turn"),
                    Cue::Choice(choice) => {
                        self.announce(&format!("Selected: {}", choice.text));
                        self.play("choice");
                    }
                    Cue::Back => {
                        self.announce(BACK_MESSAGE);
                        self.play("page-turn-back");
                    }
                }
                self.enter_page(page_index);
            }
            Transition::Completed => self.finish(),
            Transition::Unchanged => {}
        }
    }

    fn enter_page(&self, index: usize) {
        let Some(page) = self.session.current_page() else {
            return;
        };

        if let Some(sound) = &page.sound {
            let id = format!("page-{index}");
            swallow("sound load", self.sounds.load(&id, sound));
            self.play(&id);
        }

        if self.read_aloud {
            self.narrator.narrate(page.text.as_str());
        }

        self.announce(&page.text);
        swallow(
            "progress announcement",
            self.announcer
                .announce_progress(index + 1, self.session.page_count(), PROGRESS_LABEL),
        );
    }

    fn finish(&self) {
        self.narrator.stop();
        self.play("complete");
        self.achievements.story_completed();
        self.announce(COMPLETION_MESSAGE);
    }

    fn narrate_current(&self) {
        if let Some(page) = self.session.current_page() {
            self.narrator.narrate(page.text.as_str());
        }
    }

    fn announce(&self, message: &str) {
        swallow("announcement", self.announcer.announce(message));
    }

    fn play(&self, id: &str) {
        swallow("sound", self.sounds.play(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::MoveKind;
    use crate::errors::EffectError;
    use crate::config::BasePath;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use story_content::Page;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Announce(String),
        Load(String, String),
        Play(String),
        Completed,
    }

    /// Records every collaborator call in order.
    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
        fail: bool,
    }

    impl Recorder {
        fn failing() -> Arc<Self> {
            Arc::new(Self {
                fail: true,
                ..Self::default()
            })
        }

        fn push(&self, event: Event) -> Result<(), EffectError> {
            self.events.lock().unwrap().push(event);
            if self.fail {
                Err(EffectError::Sound("speaker unplugged".into()))
            } else {
                Ok(())
            }
        }

        fn take(&self) -> Vec<Event> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }

        fn announcements(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| match e {
                    Event::Announce(m) => Some(m.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl Announcer for Recorder {
        fn announce(&self, message: &str) -> Result<(), EffectError> {
            self.push(Event::Announce(message.to_string()))
        }
    }

    impl SoundPlayer for Recorder {
        fn load(&self, id: &str, url: &str) -> Result<(), EffectError> {
            self.push(Event::Load(id.to_string(), url.to_string()))
        }

        fn play(&self, id: &str) -> Result<(), EffectError> {
            self.push(Event::Play(id.to_string()))
        }
    }

    impl AchievementTracker for Recorder {
        fn story_completed(&self) {
            let _ = self.push(Event::Completed);
        }
    }

    #[derive(Default)]
    struct RecordingSpeech {
        spoken: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Speech for RecordingSpeech {
        async fn speak(&self, text: &str) -> Result<(), EffectError> {
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn cancel(&self) {}
    }

    fn announce(m: &str) -> Event {
        Event::Announce(m.to_string())
    }

    fn play(id: &str) -> Event {
        Event::Play(id.to_string())
    }

    fn collaborators(recorder: &Arc<Recorder>) -> Collaborators {
        Collaborators::default()
            .with_announcer(recorder.clone())
            .with_sounds(recorder.clone())
            .with_achievements(recorder.clone())
    }

    /// 0 and 1 are linear, 1 branches to 2 or a missing page, 2 is the end.
    fn branching_story() -> Arc<Story> {
        Arc::new(Story::new("forest", "The Forest").with_pages([
            Page::new("A fox wakes up.").with_sound("/sounds/fox.mp3"),
            Page::new("Where should the fox go?")
                .with_choice(Choice::new("To the river", 2))
                .with_choice(Choice::new("To the mountain", 5)),
            Page::new("The fox drinks at the river.").with_image("/animals/fox.png"),
        ]))
    }

    fn open(story: Option<Arc<Story>>) -> (StoryReader, Arc<Recorder>) {
        init_logging();
        let recorder = Arc::new(Recorder::default());
        let reader = StoryReader::open(story, collaborators(&recorder), &ReaderConfig::default());
        (reader, recorder)
    }

    #[test]
    fn test_open_announces_and_preloads() {
        let (_reader, recorder) = open(Some(branching_story()));
        let events = recorder.take();

        assert_eq!(
            events[0],
            announce("Starting story: The Forest. Use arrow keys to navigate between pages.")
        );
        let loads: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::Load(id, _) => Some(id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            loads,
            ["page-turn", "page-turn-back", "choice", "complete", "click", "page-0"]
        );
        assert_eq!(
            &events[events.len() - 3..],
            &[
                play("page-0"),
                announce("A fox wakes up."),
                announce("Story progress: 1 out of 3 complete"),
            ]
        );
    }

    #[test]
    fn test_missing_story_is_silent() {
        let (reader, recorder) = open(None);
        assert_eq!(reader.state(), &NavigationState::NotFound);
        assert!(recorder.take().is_empty());
        assert!(reader.display_text().is_none());
    }

    #[test]
    fn test_advance_plays_page_turn_then_enters() {
        let (mut reader, recorder) = open(Some(branching_story()));
        recorder.take();

        assert_eq!(
            reader.advance(),
            Transition::Entered {
                page_index: 1,
                cause: MoveKind::Advance
            }
        );
        assert_eq!(
            recorder.take(),
            [
                play("page-turn"),
                announce("Where should the fox go?"),
                announce("Story progress: 2 out of 3 complete"),
            ]
        );
    }

    #[test]
    fn test_choice_announces_selection() {
        let (mut reader, recorder) = open(Some(branching_story()));
        reader.advance();
        recorder.take();

        reader.select_choice_at(0).unwrap();
        assert_eq!(
            recorder.take(),
            [
                announce("Selected: To the river"),
                play("choice"),
                announce("The fox drinks at the river."),
                announce("Story progress: 3 out of 3 complete"),
            ]
        );
    }

    #[test]
    fn test_broken_link_holds_position() {
        let (mut reader, recorder) = open(Some(branching_story()));
        reader.advance();
        recorder.take();

        let err = reader.select_choice_at(1).unwrap_err();
        assert_eq!(err.target, 5);
        assert_eq!(reader.session().page_index(), Some(1));
        assert_eq!(recorder.take(), [announce(MISSING_PAGE_MESSAGE), play("click")]);
    }

    #[test]
    fn test_back_announces() {
        let (mut reader, recorder) = open(Some(branching_story()));
        reader.advance();
        recorder.take();

        reader.go_back();
        let events = recorder.take();
        assert_eq!(&events[..2], &[announce(BACK_MESSAGE), play("page-turn-back")]);
        assert_eq!(reader.session().page_index(), Some(0));

        // nothing further back
        assert_eq!(reader.go_back(), Transition::Unchanged);
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn test_completion_effects_fire_once() {
        let (mut reader, recorder) = open(Some(branching_story()));
        reader.advance();
        reader.select_choice_at(0).unwrap();
        recorder.take();

        assert_eq!(reader.advance(), Transition::Completed);
        assert_eq!(
            recorder.take(),
            [play("complete"), Event::Completed, announce(COMPLETION_MESSAGE)]
        );

        assert_eq!(reader.advance(), Transition::Unchanged);
        assert_eq!(reader.complete(), Transition::Unchanged);
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn test_complete_from_first_page() {
        let (mut reader, recorder) = open(Some(branching_story()));
        recorder.take();

        assert_eq!(reader.complete(), Transition::Completed);
        assert!(recorder.take().contains(&Event::Completed));
        assert_eq!(reader.actions(), Actions::default());
    }

    #[test]
    fn test_failing_collaborators_do_not_block_navigation() {
        init_logging();
        let recorder = Recorder::failing();
        let mut reader =
            StoryReader::open(Some(branching_story()), collaborators(&recorder), &ReaderConfig::default());

        reader.advance();
        reader.select_choice_at(0).unwrap();
        assert_eq!(reader.advance(), Transition::Completed);
        assert!(recorder.announcements().contains(&COMPLETION_MESSAGE.to_string()));
    }

    #[test]
    fn test_simplified_text_toggle() {
        let long = "Once upon a time, there was a very hungry caterpillar. \
                    It ate one apple on Monday and two pears on Tuesday.";
        let story = Arc::new(Story::new("bug", "Bug").with_page(Page::new(long)));
        let (mut reader, recorder) = open(Some(story));
        recorder.take();

        assert_eq!(reader.display_text().as_deref(), Some(long));

        assert!(reader.toggle_simplified_text());
        assert_eq!(
            reader.display_text(),
            Some(TextSimplifier::standard().simplify(long))
        );
        assert_ne!(reader.display_text().as_deref(), Some(long));
        assert_eq!(recorder.take(), [play("click"), announce("Showing simplified text")]);

        assert!(!reader.toggle_simplified_text());
        assert_eq!(reader.display_text().as_deref(), Some(long));
        assert_eq!(recorder.take(), [play("click"), announce("Showing full text")]);
    }

    #[test]
    fn test_current_illustration() {
        let (mut reader, _recorder) = open(Some(branching_story()));
        let resolver = ImageResolver::new(BasePath::parse("/kids-learn"));

        assert!(reader.current_illustration(&resolver).is_none());
        reader.advance();
        reader.select_choice_at(0).unwrap();
        assert_eq!(
            reader.current_illustration(&resolver).as_deref(),
            Some("/kids-learn/images/animals/fox.png")
        );
    }

    #[tokio::test]
    async fn test_read_aloud_follows_pages() {
        init_logging();
        let recorder = Arc::new(Recorder::default());
        let speech = Arc::new(RecordingSpeech::default());
        let mut reader = StoryReader::open(
            Some(branching_story()),
            collaborators(&recorder).with_speech(speech.clone()),
            &ReaderConfig::default(),
        );

        assert!(reader.toggle_read_aloud());
        tokio::task::yield_now().await;
        reader.advance();
        tokio::task::yield_now().await;

        assert_eq!(
            speech.spoken.lock().unwrap().as_slice(),
            &["A fox wakes up.", "Where should the fox go?"]
        );

        assert!(!reader.toggle_read_aloud());
        reader.go_back();
        tokio::task::yield_now().await;
        assert_eq!(speech.spoken.lock().unwrap().len(), 2);
    }
}
