//! Questboard CLI
//!
//! Command-line front end over the content relationship and identity engine,
//! backed by a local SQLite store.

use anyhow::Result;
use clap::Parser;
use questboard::boards::BoardQuery;
use questboard::cli::board::{BoardArgs, BoardCommand};
use questboard::cli::item::ItemCommand;
use questboard::cli::quest::QuestCommand;
use questboard::cli::{Cli, Command};
use questboard::config::Config;
use questboard::db::Database;
use questboard::export::Snapshot;
use questboard::format::{self, OutputFormat};
use questboard::logging::{self, LogTarget};
use questboard::repo::Repository;
use questboard::service::{NewItem, NewQuest, QuestService};
use questboard::types::{Board, ItemSubtype, ItemType, Visibility};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

fn emit<T: Serialize>(format: OutputFormat, value: &T, markdown: impl FnOnce() -> String) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", format::to_json(value)?),
        OutputFormat::Markdown => print!("{}", markdown()),
    }
    Ok(())
}

fn board_query(args: &BoardArgs, default_limit: usize) -> BoardQuery {
    BoardQuery::new(args.user.as_deref(), args.limit.unwrap_or(default_limit)).exclude_own(args.exclude_own)
}

fn visibility(private: bool) -> Visibility {
    if private { Visibility::Private } else { Visibility::Public }
}

fn run_quest(service: &QuestService<Database>, cmd: QuestCommand, out: OutputFormat) -> Result<()> {
    match cmd {
        QuestCommand::Create(args) => {
            let mut input = NewQuest::new(args.title, args.author);
            input.id = args.id;
            input.collaborators = args.collaborators;
            input.head_item_id = args.head;
            input.visibility = visibility(args.private);
            let quest = service.create_quest(input)?;
            emit(out, &quest, || format::format_quest_markdown(&quest, &[]))
        }
        QuestCommand::Show { id } => {
            let quest = service.get_quest(&id)?;
            let items = service.repo().read_items(Some(id.as_str()))?;
            emit(out, &quest, || format::format_quest_markdown(&quest, &items))
        }
        QuestCommand::Graph { id } => {
            let report = service.quest_graph(&id)?;
            emit(out, &report, || format::format_graph_markdown(&report))
        }
    }
}

fn run_item(service: &QuestService<Database>, cmd: ItemCommand, out: OutputFormat) -> Result<()> {
    match cmd {
        ItemCommand::Create(args) => {
            let mut input = NewItem::new(ItemType::parse(&args.item_type)?, args.author);
            input.subtype = args.subtype.as_deref().map(ItemSubtype::parse).transpose()?;
            input.id = args.id;
            input.parent_id = args.parent;
            input.quest_id = args.quest;
            input.tags = args.tags;
            input.links = args.links;
            input.visibility = visibility(args.private);
            let item = service.create_item(input)?;
            emit(out, &item, || format::format_item_markdown(&item))
        }
        ItemCommand::Validate(args) => {
            let item_type = ItemType::parse(&args.item_type)?;
            let subtype = args.subtype.as_deref().map(ItemSubtype::parse).transpose()?;
            let verdict = service.validate(args.parent.as_deref(), item_type, subtype)?;
            emit(out, &verdict, || format!("{:?}\n", verdict))
        }
        ItemCommand::Show { id } => {
            let item = service.get_item(&id)?;
            emit(out, &item, || format::format_item_markdown(&item))
        }
        ItemCommand::Archive { id } => {
            let item = service.archive_item(&id)?;
            emit(out, &item, || format::format_item_markdown(&item))
        }
    }
}

fn run_board(service: &QuestService<Database>, cmd: BoardCommand, config: &Config, out: OutputFormat) -> Result<()> {
    let limits = &config.boards;
    match cmd {
        BoardCommand::Timeline(args) => {
            let mut timeline = service.timeline(args.user.as_deref())?;
            timeline.ids.truncate(args.limit.unwrap_or(limits.timeline_limit));
            emit(out, &timeline, || format::format_timeline_markdown(&timeline))
        }
        BoardCommand::Requests(args) => {
            let ids = service.request_board(&board_query(&args, limits.request_limit))?;
            let board = Board { id: "requests".to_string(), items: ids };
            emit(out, &board, || format::format_board_markdown(&board))
        }
        BoardCommand::ActiveQuests(args) => {
            let ids = service.active_quests(&board_query(&args, limits.active_quest_limit))?;
            let board = Board { id: "active-quests".to_string(), items: ids };
            emit(out, &board, || format::format_board_markdown(&board))
        }
        BoardCommand::Show { id, args } => {
            let default_limit = match id.as_str() {
                "requests" => limits.request_limit,
                "active-quests" => limits.active_quest_limit,
                _ => limits.timeline_limit,
            };
            let board = service.board(&id, &board_query(&args, default_limit))?;
            emit(out, &board, || format::format_board_markdown(&board))
        }
        BoardCommand::Save { id, items } => {
            let board = Board { id, items };
            service.save_board(&board)?;
            emit(out, &board, || format::format_board_markdown(&board))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut config = Config::load_or_default(cli.config.as_deref().map(Path::new))?;
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }
    config.ensure_db_dir()?;
    debug!(db_path = %config.server.db_path.display(), "Opening database");

    let db = Database::open(&config.server.db_path)?;

    if let Command::Export(args) = &cli.command {
        let json = Snapshot::from_database(&db)?.to_json()?;
        match &args.output {
            Some(path) => {
                std::fs::write(path, json)?;
                info!(path = %path.display(), "Snapshot exported");
            }
            None => println!("{}", json),
        }
        return Ok(());
    }

    let service = QuestService::new(db);
    let out = cli.format;
    match cli.command {
        Command::Quest(cmd) => run_quest(&service, cmd, out),
        Command::Item(cmd) => run_item(&service, cmd, out),
        Command::Board(cmd) => run_board(&service, cmd, &config, out),
        Command::Export(_) => Ok(()),
    }
}
