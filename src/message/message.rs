use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::encoder;
use super::envelope::PushEnvelope;
use super::error::MessageResult;
use super::types::{ApnsSound, CollapseKey, Platform, Priority, PushType};

/// A platform-agnostic push notification
///
/// Built per send, mutated through setters, then rendered once per target
/// platform by [`Message::serialize`].
#[derive(Debug, Clone)]
pub struct Message {
    text: Option<String>,
    title: Option<String>,
    title_localized_key: Option<String>,
    title_localized_arguments: Option<Vec<String>>,
    subtitle: Option<String>,
    subtitle_localized_key: Option<String>,
    subtitle_localized_arguments: Option<Vec<String>>,
    localized_key: Option<String>,
    localized_arguments: Option<Vec<String>>,
    category: Option<String>,
    priority: Priority,
    badge: Option<u32>,
    sound: Option<String>,
    apns_sound: Option<ApnsSound>,
    content_available: bool,
    thread_id: Option<String>,
    mutable_content: bool,
    push_type: PushType,
    custom: Map<String, Value>,
    adm_data: Option<Map<String, Value>>,
    apns_data: Option<Map<String, Value>>,
    fcm_data: Option<Map<String, Value>>,
    fcm_top_level_data: Option<Map<String, Value>>,
    gcm_data: Option<Map<String, Value>>,
    collapse_key: CollapseKey,
    ttl: Option<u64>,
    delay_while_idle: bool,
    allow_trimming: bool,
    platforms: BTreeSet<Platform>,
    platforms_customized: bool,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            text: None,
            title: None,
            title_localized_key: None,
            title_localized_arguments: None,
            subtitle: None,
            subtitle_localized_key: None,
            subtitle_localized_arguments: None,
            localized_key: None,
            localized_arguments: None,
            category: None,
            priority: Priority::default(),
            badge: None,
            sound: None,
            apns_sound: None,
            content_available: false,
            thread_id: None,
            mutable_content: false,
            push_type: PushType::default(),
            custom: Map::new(),
            adm_data: None,
            apns_data: None,
            fcm_data: None,
            fcm_top_level_data: None,
            gcm_data: None,
            collapse_key: CollapseKey::default(),
            ttl: None,
            delay_while_idle: false,
            allow_trimming: true,
            platforms: Platform::DEFAULT.into_iter().collect(),
            platforms_customized: false,
        }
    }
}

impl Message {
    /// Create a message with body text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Render one payload per requested platform
    ///
    /// Fails on the first platform whose payload cannot be made to fit its
    /// byte budget.
    pub fn serialize(&self) -> MessageResult<PushEnvelope> {
        let mut envelope = PushEnvelope::new(self.text.clone());
        for platform in self.rendered_platforms() {
            let payload = encoder::encode(self, platform)?;
            envelope.insert(platform, payload);
        }
        Ok(envelope)
    }

    /// Platforms `serialize` renders, in envelope order
    ///
    /// FCM supersedes GCM: when both are requested only FCM is rendered.
    pub fn rendered_platforms(&self) -> Vec<Platform> {
        let fcm = self.platforms.contains(&Platform::Fcm);
        [
            Platform::Apns,
            Platform::ApnsVoip,
            Platform::Fcm,
            Platform::Gcm,
            Platform::Adm,
        ]
        .into_iter()
        .filter(|platform| self.platforms.contains(platform))
        .filter(|platform| !(fcm && *platform == Platform::Gcm))
        .collect()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Body text; trimmed where a platform payload would be too long
    pub fn set_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(text.into());
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = Some(title.into());
        self
    }

    pub fn title_localized_key(&self) -> Option<&str> {
        self.title_localized_key.as_deref()
    }

    pub fn set_title_localized_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.title_localized_key = Some(key.into());
        self
    }

    pub fn title_localized_arguments(&self) -> Option<&[String]> {
        self.title_localized_arguments.as_deref()
    }

    pub fn set_title_localized_arguments(&mut self, arguments: Vec<String>) -> &mut Self {
        self.title_localized_arguments = Some(arguments);
        self
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    pub fn set_subtitle(&mut self, subtitle: impl Into<String>) -> &mut Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn subtitle_localized_key(&self) -> Option<&str> {
        self.subtitle_localized_key.as_deref()
    }

    pub fn set_subtitle_localized_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.subtitle_localized_key = Some(key.into());
        self
    }

    pub fn subtitle_localized_arguments(&self) -> Option<&[String]> {
        self.subtitle_localized_arguments.as_deref()
    }

    pub fn set_subtitle_localized_arguments(&mut self, arguments: Vec<String>) -> &mut Self {
        self.subtitle_localized_arguments = Some(arguments);
        self
    }

    pub fn localized_key(&self) -> Option<&str> {
        self.localized_key.as_deref()
    }

    /// Key of a localized string displayed instead of the text
    pub fn set_localized_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.localized_key = Some(key.into());
        self
    }

    pub fn localized_arguments(&self) -> Option<&[String]> {
        self.localized_arguments.as_deref()
    }

    /// Arguments for the localized body; ignored unless a localized key is set
    pub fn set_localized_arguments(&mut self, arguments: Vec<String>) -> &mut Self {
        self.localized_arguments = Some(arguments);
        self
    }

    /// Set the localized body key and its arguments together
    pub fn set_localized_text(
        &mut self,
        key: impl Into<String>,
        arguments: Option<Vec<String>>,
    ) -> &mut Self {
        self.localized_key = Some(key.into());
        self.localized_arguments = arguments;
        self
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Notification category on APNS, channel id on FCM
    pub fn set_category(&mut self, category: impl Into<String>) -> &mut Self {
        self.category = Some(category.into());
        self
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn set_priority(&mut self, priority: Priority) -> &mut Self {
        self.priority = priority;
        self
    }

    pub fn badge(&self) -> Option<u32> {
        self.badge
    }

    pub fn set_badge(&mut self, badge: u32) -> &mut Self {
        self.badge = Some(badge);
        self
    }

    pub fn sound(&self) -> Option<&str> {
        self.sound.as_deref()
    }

    pub fn set_sound(&mut self, sound: impl Into<String>) -> &mut Self {
        self.sound = Some(sound.into());
        self
    }

    pub fn apns_sound(&self) -> Option<&ApnsSound> {
        self.apns_sound.as_ref()
    }

    /// APNS only sound, takes precedence over `sound` there
    pub fn set_apns_sound(&mut self, sound: ApnsSound) -> &mut Self {
        self.apns_sound = Some(sound);
        self
    }

    pub fn is_content_available(&self) -> bool {
        self.content_available
    }

    /// Background fetch flag; enabling it switches the push type to background
    pub fn set_content_available(&mut self, content_available: bool) -> &mut Self {
        self.content_available = content_available;
        if content_available {
            self.push_type = PushType::Background;
        }
        self
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn set_thread_id(&mut self, thread_id: impl Into<String>) -> &mut Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn is_mutable_content(&self) -> bool {
        self.mutable_content
    }

    pub fn set_mutable_content(&mut self, mutable_content: bool) -> &mut Self {
        self.mutable_content = mutable_content;
        self
    }

    pub fn push_type(&self) -> PushType {
        self.push_type
    }

    pub fn set_push_type(&mut self, push_type: PushType) -> &mut Self {
        self.push_type = push_type;
        self
    }

    pub fn custom(&self) -> &Map<String, Value> {
        &self.custom
    }

    /// Data merged into every platform payload
    pub fn set_custom(&mut self, custom: Map<String, Value>) -> &mut Self {
        self.custom = custom;
        self
    }

    pub fn adm_data(&self) -> Option<&Map<String, Value>> {
        self.adm_data.as_ref()
    }

    /// Merged into the ADM `data` object
    pub fn set_adm_data(&mut self, data: Map<String, Value>) -> &mut Self {
        self.adm_data = Some(data);
        self
    }

    pub fn apns_data(&self) -> Option<&Map<String, Value>> {
        self.apns_data.as_ref()
    }

    /// Merged at the top level of the APNS payload, beside `aps`
    pub fn set_apns_data(&mut self, data: Map<String, Value>) -> &mut Self {
        self.apns_data = Some(data);
        self
    }

    pub fn fcm_data(&self) -> Option<&Map<String, Value>> {
        self.fcm_data.as_ref()
    }

    /// Merged into the FCM `data` object
    pub fn set_fcm_data(&mut self, data: Map<String, Value>) -> &mut Self {
        self.fcm_data = Some(data);
        self
    }

    pub fn fcm_top_level_data(&self) -> Option<&Map<String, Value>> {
        self.fcm_top_level_data.as_ref()
    }

    /// Merged at the top level of the FCM payload
    pub fn set_fcm_top_level_data(&mut self, data: Map<String, Value>) -> &mut Self {
        self.fcm_top_level_data = Some(data);
        self
    }

    pub fn gcm_data(&self) -> Option<&Map<String, Value>> {
        self.gcm_data.as_ref()
    }

    /// Merged into the GCM `data` object
    pub fn set_gcm_data(&mut self, data: Map<String, Value>) -> &mut Self {
        self.gcm_data = Some(data);
        self
    }

    pub fn collapse_key(&self) -> &CollapseKey {
        &self.collapse_key
    }

    /// `None` or an empty key resets to the no-collapse sentinel
    pub fn set_collapse_key(&mut self, key: Option<impl Into<String>>) -> &mut Self {
        self.collapse_key = CollapseKey::new(key);
        self
    }

    pub fn ttl(&self) -> Option<u64> {
        self.ttl
    }

    /// Seconds the relay should retain the message (ADM, FCM, GCM)
    pub fn set_ttl(&mut self, ttl: u64) -> &mut Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn delay_while_idle(&self) -> bool {
        self.delay_while_idle
    }

    pub fn set_delay_while_idle(&mut self, delay_while_idle: bool) -> &mut Self {
        self.delay_while_idle = delay_while_idle;
        self
    }

    pub fn allow_trimming(&self) -> bool {
        self.allow_trimming
    }

    pub fn set_allow_trimming(&mut self, allow_trimming: bool) -> &mut Self {
        self.allow_trimming = allow_trimming;
        self
    }

    pub fn platforms(&self) -> &BTreeSet<Platform> {
        &self.platforms
    }

    /// Platforms to render payloads (and raise length errors) for
    pub fn set_platforms(&mut self, platforms: impl IntoIterator<Item = Platform>) -> &mut Self {
        self.platforms = platforms.into_iter().collect();
        self.platforms_customized = true;
        self
    }

    /// Whether the caller ever chose the platforms explicitly
    pub fn is_platforms_customized(&self) -> bool {
        self.platforms_customized
    }
}

/// Inbound request body describing a message
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MessageRequest {
    pub text: Option<String>,
    pub title: Option<String>,
    pub title_localized_key: Option<String>,
    pub title_localized_arguments: Option<Vec<String>>,
    pub subtitle: Option<String>,
    pub subtitle_localized_key: Option<String>,
    pub subtitle_localized_arguments: Option<Vec<String>>,
    pub localized_key: Option<String>,
    pub localized_arguments: Option<Vec<String>>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub badge: Option<u32>,
    pub sound: Option<String>,
    pub apns_sound: Option<ApnsSound>,
    pub content_available: Option<bool>,
    pub thread_id: Option<String>,
    pub mutable_content: Option<bool>,
    pub push_type: Option<PushType>,
    pub custom: Option<Map<String, Value>>,
    pub adm_data: Option<Map<String, Value>>,
    pub apns_data: Option<Map<String, Value>>,
    pub fcm_data: Option<Map<String, Value>>,
    pub fcm_top_level_data: Option<Map<String, Value>>,
    pub gcm_data: Option<Map<String, Value>>,
    pub collapse_key: Option<String>,
    pub ttl: Option<u64>,
    pub delay_while_idle: Option<bool>,
    pub allow_trimming: Option<bool>,
    pub platforms: Option<Vec<Platform>>,
}

impl From<MessageRequest> for Message {
    fn from(req: MessageRequest) -> Self {
        let mut message = Message::default();
        message.text = req.text;
        message.title = req.title;
        message.title_localized_key = req.title_localized_key;
        message.title_localized_arguments = req.title_localized_arguments;
        message.subtitle = req.subtitle;
        message.subtitle_localized_key = req.subtitle_localized_key;
        message.subtitle_localized_arguments = req.subtitle_localized_arguments;
        message.localized_key = req.localized_key;
        message.localized_arguments = req.localized_arguments;
        message.category = req.category;
        message.badge = req.badge;
        message.sound = req.sound;
        message.apns_sound = req.apns_sound;
        message.thread_id = req.thread_id;
        message.adm_data = req.adm_data;
        message.apns_data = req.apns_data;
        message.fcm_data = req.fcm_data;
        message.fcm_top_level_data = req.fcm_top_level_data;
        message.gcm_data = req.gcm_data;
        message.ttl = req.ttl;
        message.collapse_key = CollapseKey::new(req.collapse_key);

        if let Some(priority) = req.priority {
            message.priority = priority;
        }
        if let Some(push_type) = req.push_type {
            message.push_type = push_type;
        }
        // Applied after push_type so content-available still forces background
        if let Some(content_available) = req.content_available {
            message.set_content_available(content_available);
        }
        if let Some(mutable_content) = req.mutable_content {
            message.mutable_content = mutable_content;
        }
        if let Some(custom) = req.custom {
            message.custom = custom;
        }
        if let Some(delay_while_idle) = req.delay_while_idle {
            message.delay_while_idle = delay_while_idle;
        }
        if let Some(allow_trimming) = req.allow_trimming {
            message.allow_trimming = allow_trimming;
        }
        if let Some(platforms) = req.platforms {
            message.set_platforms(platforms);
        }

        message
    }
}
