//! Demo records every new workspace and the moderation desk start from.

use chrono::{DateTime, Duration, Utc};

use crate::auth::Role;
use crate::inbox::Inbox;
use crate::models::*;
use crate::moderation::ModerationDesk;
use crate::network::Network;

fn person(id: &str, name: &str, role: &str, location: &str) -> Person {
    Person {
        id: id.to_string(),
        name: name.to_string(),
        role: role.to_string(),
        location: location.to_string(),
        avatar: format!("/avatars/{id}.jpg"),
    }
}

pub fn network(now: DateTime<Utc>) -> Network {
    let connection = |id, name, role, location, days| Connection {
        person: person(id, name, role, location),
        connected_at: now - Duration::days(days),
    };
    let pending = |id, name, role, location, direction, hours| PendingRequest {
        person: person(id, name, role, location),
        direction,
        requested_at: now - Duration::hours(hours),
    };
    let suggestion = |id, name, role, location, mutuals| Suggestion { person: person(id, name, role, location), mutuals };
    Network {
        connections: vec![
            connection("c1", "Sarah Johnson", "Film Editor", "Los Angeles", 3),
            connection("c2", "Marcus Lee", "Cinematographer", "Vancouver", 12),
            connection("c3", "Elena Rossi", "Production Designer", "Rome", 40),
            connection("c4", "David Okafor", "Sound Mixer", "Lagos", 90),
        ],
        pending: vec![
            pending("p1", "Hana Kim", "Colorist", "Seoul", Direction::Received, 5),
            pending("p2", "Tom Becker", "Gaffer", "Berlin", Direction::Received, 30),
            pending("p3", "Lucia Alvarez", "Screenwriter", "Madrid", Direction::Sent, 48),
        ],
        suggestions: vec![
            suggestion("s1", "Priya Singh", "Director", "Mumbai", 4),
            suggestion("s2", "James Carter", "Producer", "London", 7),
            suggestion("s3", "Aiko Tanaka", "VFX Supervisor", "Tokyo", 2),
            suggestion("s4", "Noah Williams", "Assistant Editor", "New York", 5),
        ],
    }
}

pub fn inbox(now: DateTime<Utc>) -> Inbox {
    let msg = |id: &str, sender, kind, content: &str, mins, read| ChatMessage {
        id: id.to_string(),
        sender,
        kind,
        content: content.to_string(),
        timestamp: now - Duration::minutes(mins),
        read,
    };
    Inbox::new(vec![
        Conversation {
            id: "conv1".into(),
            participant: person("c1", "Sarah Johnson", "Film Editor", "Los Angeles"),
            messages: vec![
                msg("m1", Sender::Them, MessageKind::Text, "Rough cut is ready for review.", 90, true),
                msg("m2", Sender::Me, MessageKind::Text, "Great, I'll take a look tonight.", 80, true),
                msg("m3", Sender::Them, MessageKind::Video, "https://cdn.filmcollab.dev/cuts/rough-v2.mp4", 15, false),
            ],
            unread: 1,
        },
        Conversation {
            id: "conv2".into(),
            participant: person("c2", "Marcus Lee", "Cinematographer", "Vancouver"),
            messages: vec![
                msg("m4", Sender::Me, MessageKind::Text, "Are you free for the location scout on Friday?", 600, true),
                msg("m5", Sender::Them, MessageKind::Text, "Yes, count me in.", 540, true),
            ],
            unread: 0,
        },
        Conversation {
            id: "conv3".into(),
            participant: person("c3", "Elena Rossi", "Production Designer", "Rome"),
            messages: vec![
                msg("m6", Sender::Them, MessageKind::Image, "https://cdn.filmcollab.dev/boards/set-a.jpg", 240, false),
                msg("m7", Sender::Them, MessageKind::Document, "https://cdn.filmcollab.dev/boards/set-a.pdf", 235, false),
            ],
            unread: 2,
        },
    ])
}

pub fn projects(now: DateTime<Utc>) -> Vec<Project> {
    let today = now.date_naive();
    let project = |id: &str, title: &str, kind: &str, status, genre: &str, featured, popular, days| Project {
        id: id.to_string(),
        title: title.to_string(),
        industry: "Film".to_string(),
        kind: kind.to_string(),
        status,
        location: "Los Angeles".to_string(),
        created_date: today - Duration::days(days),
        description: format!("{title}: a {genre} {kind} looking for collaborators."),
        tagline: format!("A {} story", genre.to_lowercase()),
        team_members: vec!["Sarah Johnson".to_string(), "Marcus Lee".to_string()],
        roles_required: vec!["Editor".to_string(), "Composer".to_string()],
        budget: "$50k - $100k".to_string(),
        duration: "3 months".to_string(),
        genre: genre.to_string(),
        featured,
        popular,
        joined: false,
        saved: false,
    };
    vec![
        project("pr1", "Monsoon Letters", "Feature", ProjectStatus::Ongoing, "Drama", true, true, 5),
        project("pr2", "Neon Tide", "Short", ProjectStatus::Planning, "Thriller", false, true, 9),
        project("pr3", "The Last Reel", "Documentary", ProjectStatus::PostProduction, "History", true, false, 20),
        project("pr4", "Paper Moons", "Series", ProjectStatus::Completed, "Comedy", false, false, 60),
        project("pr5", "Static Bloom", "Music Video", ProjectStatus::Ongoing, "Experimental", false, false, 2),
    ]
}

pub fn directory(now: DateTime<Utc>) -> Vec<DirectoryItem> {
    let meta = |id: &str, title: &str, user: &str, days, views, tags: &[&str]| UploadMeta {
        id: id.to_string(),
        title: title.to_string(),
        username: user.to_string(),
        upload_date: now - Duration::days(days),
        views,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    };
    let cdn = |path: &str| format!("https://cdn.filmcollab.dev/{path}");
    vec![
        DirectoryItem::Video { meta: meta("d1", "Opening Sequence", "sarah", 1, 320, &["edit", "drama"]), video_url: cdn("v/opening.mp4") },
        DirectoryItem::Image { meta: meta("d2", "Set Design Board", "elena", 2, 145, &["design"]), thumbnail_url: cdn("i/board.jpg") },
        DirectoryItem::Document {
            meta: meta("d3", "Shooting Script", "lucia", 4, 88, &["script"]),
            file_url: cdn("d/script.pdf"),
            ext: "pdf".into(),
        },
        DirectoryItem::Audio { meta: meta("d4", "Main Theme Demo", "noah", 6, 230, &["score"]), audio_url: cdn("a/theme.mp3") },
        DirectoryItem::Image { meta: meta("d5", "Golden Hour Still", "marcus", 10, 510, &["cinematography"]), thumbnail_url: cdn("i/golden.jpg") },
        DirectoryItem::Video { meta: meta("d6", "Color Grade Reel", "hana", 15, 402, &["color"]), video_url: cdn("v/grade.mp4") },
        DirectoryItem::Document {
            meta: meta("d7", "Budget Breakdown", "james", 25, 37, &["production"]),
            file_url: cdn("d/budget.xlsx"),
            ext: "xlsx".into(),
        },
        DirectoryItem::Audio { meta: meta("d8", "Foley Pack", "david", 45, 129, &["sound"]), audio_url: cdn("a/foley.wav") },
        DirectoryItem::Video { meta: meta("d9", "Behind the Scenes", "priya", 120, 760, &["bts"]), video_url: cdn("v/bts.mp4") },
    ]
}

pub fn feed(now: DateTime<Utc>) -> Vec<CommunityPost> {
    let post = |id: &str, author: &str, content: &str, media, hours, likes| CommunityPost {
        id: id.to_string(),
        author: author.to_string(),
        content: content.to_string(),
        media,
        created_at: now - Duration::hours(hours),
        likes,
        liked: false,
        comments: likes / 4,
    };
    vec![
        post("f1", "Priya Singh", "Wrapped principal photography on Monsoon Letters!", None, 2, 48),
        post(
            "f2",
            "Marcus Lee",
            "Testing a new anamorphic set this week.",
            Some(PostMedia::Image { url: "https://cdn.filmcollab.dev/i/lens-test.jpg".into() }),
            7,
            31,
        ),
        post("f3", "Hana Kim", "Looking for a DIT in Seoul for a two-week shoot.", None, 26, 12),
        post(
            "f4",
            "Noah Williams",
            "Temp score for the festival cut.",
            Some(PostMedia::Audio { url: "https://cdn.filmcollab.dev/a/temp-score.mp3".into() }),
            50,
            20,
        ),
    ]
}

pub fn moderation_desk(now: DateTime<Utc>) -> ModerationDesk {
    let ago = |days| now - Duration::days(days);
    let user = |id: &str, name: &str, email: &str, role, status, days| AdminUser {
        id: id.into(),
        name: name.into(),
        email: email.into(),
        role,
        status,
        joined_at: ago(days),
    };
    let post = |id: &str, author: &str, excerpt: &str, status, reports, days| AdminPost {
        id: id.into(),
        author: author.into(),
        excerpt: excerpt.into(),
        status,
        reports,
        created_at: ago(days),
    };
    ModerationDesk {
        users: vec![
            user("u1", "Sarah Johnson", "sarah@filmcollab.dev", Role::User, UserStatus::Active, 200),
            user("u2", "Marcus Lee", "marcus@filmcollab.dev", Role::User, UserStatus::Active, 150),
            user("u3", "Tom Becker", "tom@filmcollab.dev", Role::User, UserStatus::Suspended, 90),
            user("u4", "Ava Chen", "ava@filmcollab.dev", Role::Admin, UserStatus::Active, 400),
        ],
        posts: vec![
            post("ap1", "Priya Singh", "Wrapped principal photography...", PostStatus::Published, 0, 1),
            post("ap2", "Tom Becker", "Cheap gear, DM me...", PostStatus::Flagged, 5, 2),
            post("ap3", "Hana Kim", "Looking for a DIT in Seoul...", PostStatus::Pending, 0, 1),
        ],
        projects: vec![
            AdminProject {
                id: "apr1".into(),
                title: "Neon Tide".into(),
                owner: "Marcus Lee".into(),
                status: ReviewStatus::Pending,
                created_at: ago(3),
            },
            AdminProject {
                id: "apr2".into(),
                title: "Monsoon Letters".into(),
                owner: "Priya Singh".into(),
                status: ReviewStatus::Approved,
                created_at: ago(20),
            },
        ],
        jobs: vec![
            AdminJob {
                id: "aj1".into(),
                title: "Assistant Editor".into(),
                company: "Lighthouse Pictures".into(),
                status: ReviewStatus::Pending,
                posted_at: ago(1),
            },
            AdminJob {
                id: "aj2".into(),
                title: "Boom Operator".into(),
                company: "Northside Films".into(),
                status: ReviewStatus::Rejected,
                posted_at: ago(8),
            },
        ],
    }
}

