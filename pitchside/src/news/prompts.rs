/// Canned query for the front page feed
pub const LATEST_NEWS_QUERY: &str = "latest football news";

/// Canned query for the fixtures panel
pub const UPCOMING_MATCHES_QUERY: &str = "upcoming important football matches in europe";

/// Persona sent as the system message of every call
pub const SYSTEM_PERSONA: &str = "You are a football (soccer) news assistant. \
You report recent, factual news about clubs, leagues, players and tournaments, \
and you always follow the requested output format exactly.";

/// Placeholder url the model is told to use when it has no link
pub const PLACEHOLDER_URL: &str = "#";

const LINE_FORMAT: &str = "Return one item per line in the format: title | YYYY-MM-DD | url. \
If no url is available, use # as the url. Do not number the lines and do not add any other text.";

/// What a free-text query is asking for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryIntent {
    LatestNews,
    UpcomingMatches,
    Entity(String),
}

impl QueryIntent {
    /// Substring match against the canned intents, case-insensitive.
    pub fn classify(query: &str) -> Self {
        let lowered = query.to_lowercase();
        if lowered.contains(LATEST_NEWS_QUERY) {
            QueryIntent::LatestNews
        } else if lowered.contains(UPCOMING_MATCHES_QUERY) {
            QueryIntent::UpcomingMatches
        } else {
            QueryIntent::Entity(query.trim().to_string())
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QueryIntent::LatestNews => "latest",
            QueryIntent::UpcomingMatches => "upcoming",
            QueryIntent::Entity(_) => "entity",
        }
    }

    pub fn prompt(&self) -> String {
        match self {
            QueryIntent::LatestNews => format!(
                "List the 5 most important football news stories of the last few days. {}",
                LINE_FORMAT
            ),
            QueryIntent::UpcomingMatches => format!(
                "List the upcoming important football matches in Europe for the next two weeks. \
                 Use the match (home team vs away team, competition) as the title and the match day as the date. {}",
                LINE_FORMAT
            ),
            QueryIntent::Entity(entity) => format!(
                "List the 5 most recent football news stories about {}. {}",
                entity, LINE_FORMAT
            ),
        }
    }
}

/// Prompt for the detailed view of one story
pub fn summary_prompt(title: &str) -> String {
    format!(
        "Give a detailed summary of this football news story: \"{}\". \
         Cover the key facts, the clubs and people involved, and what it means for the rest of the season.",
        title.trim()
    )
}
