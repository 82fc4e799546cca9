use std::{collections::HashMap, fmt::Display, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

use taskdeck::{
    config::{Config, NotifyChannel},
    export::ExportFormat,
    models::{
        project::Project,
        task::{Priority, Task, TaskStatus},
    },
    services::{
        projects::{
            CreateProjectParameters, DeleteProjectParameters, create_project, delete_project,
            find_project, project_tasks,
        },
        tasks::{
            AddTaskParameters, CompleteTaskParameters, DeleteTaskParameters, ListTasksParameters,
            StartTaskParameters, add_task, complete_task, delete_task, export_tasks, list_tasks,
            remind_overdue, start_task,
        },
    },
    storage::{
        Repository, TaskRepository,
        json::{JsonFileProjectRepository, JsonFileTaskRepository},
    },
};

mod ui;

#[derive(Parser)]
#[command(
    name = "taskdeck",
    about = "Track tasks and projects, export them, and get reminded"
)]
struct Cli {
    /// Directory holding tasks.json and projects.json
    #[arg(long, env = "TASKDECK_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Notification channel: console, email, sms or slack
    #[arg(long, env = "TASKDECK_NOTIFY", default_value = "console", global = true)]
    notify: NotifyChannel,

    /// Email address, phone number or webhook URL for the channel
    #[arg(long, env = "TASKDECK_NOTIFY_TARGET", global = true)]
    notify_target: Option<String>,

    /// Slack channel to post to (e.g., "#ops")
    #[arg(long, env = "TASKDECK_SLACK_CHANNEL", global = true)]
    slack_channel: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task title
        title: String,

        /// Project id or slug the task belongs to
        #[arg(short = 'P', long)]
        project: String,

        /// Longer description
        #[arg(short, long)]
        description: Option<String>,

        /// low, medium or high
        #[arg(short, long, default_value = "medium")]
        priority: Priority,

        /// Due date (e.g., "2025-03-01" or "2025-03-01T17:00:00Z")
        #[arg(long)]
        due: Option<String>,

        /// Use this id instead of a generated one
        #[arg(long)]
        id: Option<String>,
    },

    /// Mark a task as in progress
    Start { id: String },

    /// Complete a task
    Done { id: String },

    /// Delete a task permanently
    Delete { id: String },

    /// Show one task in detail
    Show { id: String },

    /// List tasks, optionally filtered
    List(FilterArgs),

    /// Export tasks as csv, json or markdown
    Export {
        /// csv, json or markdown
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,

        /// File or directory to write to (prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Send a due reminder for every overdue task
    Remind,

    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommands),
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// todo, in_progress or done
    #[arg(short, long)]
    status: Option<TaskStatus>,

    /// low, medium or high
    #[arg(short, long)]
    priority: Option<Priority>,

    /// Only tasks past their due date
    #[arg(long)]
    overdue: bool,

    /// Due on or after this date
    #[arg(long)]
    from: Option<String>,

    /// Due on or before this date
    #[arg(long)]
    to: Option<String>,

    /// Project id or slug
    #[arg(short = 'P', long)]
    project: Option<String>,
}

#[derive(Debug, Subcommand)]
enum ProjectCommands {
    /// Create a new project
    New {
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Use this id instead of a generated one
        #[arg(long)]
        id: Option<String>,
    },
    /// Delete a project and its tasks
    Delete { id_or_slug: String },
    /// List all projects
    List,
    /// View tasks in a project
    View { id_or_slug: String },
}

fn fail(error: impl Display) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), error);
    std::process::exit(1);
}

fn init_logging() {
    // Silent unless asked for; logs go to stderr so exports on stdout stay clean
    if let Ok(directives) = std::env::var("TASKDECK_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(directives))
            .with_writer(std::io::stderr)
            .init();
    }
}

fn project_names(projects: &JsonFileProjectRepository) -> HashMap<String, Project> {
    projects
        .find_all()
        .unwrap_or_else(|e| fail(e))
        .into_iter()
        .map(|p| (p.id().to_string(), p))
        .collect()
}

fn to_list_parameters(
    filters: FilterArgs,
    projects: &JsonFileProjectRepository,
) -> ListTasksParameters {
    let project_id = filters.project.map(|wanted| {
        match find_project(projects, &wanted).unwrap_or_else(|e| fail(e)) {
            Some(project) => project.id().to_string(),
            None => fail(format!("Project '{}' not found", wanted)),
        }
    });

    ListTasksParameters {
        status: filters.status,
        priority: filters.priority,
        overdue: filters.overdue,
        due_from: filters.from,
        due_to: filters.to,
        project_id,
    }
}

fn render_tasks(title: &str, tasks: &[Task], projects: &HashMap<String, Project>) {
    ui::render_view_header(title, tasks.len());
    for task in tasks {
        ui::render_task_line(task, projects.get(task.project_id()));
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let config = Config::new(cli.data_dir, cli.notify, cli.notify_target)
        .with_slack_channel(cli.slack_channel);
    tracing::debug!(data_dir = %config.data_dir.display(), "resolved configuration");

    let mut tasks =
        JsonFileTaskRepository::open(config.tasks_path()).unwrap_or_else(|e| fail(e));
    let mut projects =
        JsonFileProjectRepository::open(config.projects_path()).unwrap_or_else(|e| fail(e));

    match cli.command {
        Some(Commands::Add {
            title,
            project,
            description,
            priority,
            due,
            id,
        }) => {
            let project_id = match find_project(&projects, &project).unwrap_or_else(|e| fail(e)) {
                Some(p) => p.id().to_string(),
                None => project,
            };
            let mut notifier = config.notifier().unwrap_or_else(|e| fail(e));
            let task = add_task(
                &mut tasks,
                &projects,
                &mut *notifier,
                AddTaskParameters {
                    id,
                    title,
                    description,
                    priority,
                    due_date: due,
                    project_id,
                },
            )
            .unwrap_or_else(|e| fail(e));
            println!("{} Added task {}", "✓".green(), task.id().bold());
        }
        Some(Commands::Start { id }) => {
            let task = start_task(&mut tasks, StartTaskParameters { task_id: id })
                .unwrap_or_else(|e| fail(e));
            println!("{} Started \"{}\"", "◐".yellow(), task.title());
        }
        Some(Commands::Done { id }) => {
            let mut notifier = config.notifier().unwrap_or_else(|e| fail(e));
            let task = complete_task(
                &mut tasks,
                &mut *notifier,
                CompleteTaskParameters { task_id: id },
            )
            .unwrap_or_else(|e| fail(e));
            println!("{} Completed \"{}\"", "✓".green(), task.title());
        }
        Some(Commands::Delete { id }) => {
            let task = delete_task(&mut tasks, DeleteTaskParameters { task_id: id })
                .unwrap_or_else(|e| fail(e));
            println!("{} Deleted \"{}\"", "✗".red(), task.title());
        }
        Some(Commands::Show { id }) => {
            let task = match tasks.find_by_id(&id).unwrap_or_else(|e| fail(e)) {
                Some(task) => task,
                None => fail(format!("Task '{}' not found", id)),
            };
            let project = projects
                .find_by_id(task.project_id())
                .unwrap_or_else(|e| fail(e));
            ui::render_task_detail(&task, project.as_ref());
        }
        Some(Commands::List(filters)) => {
            let parameters = to_list_parameters(filters, &projects);
            let listed = list_tasks(&tasks, &parameters).unwrap_or_else(|e| fail(e));
            if listed.is_empty() {
                println!("No matching tasks");
            } else {
                render_tasks("Tasks", &listed, &project_names(&projects));
            }
        }
        Some(Commands::Export {
            format,
            output,
            filters,
        }) => {
            let file_stem = filters
                .project
                .as_deref()
                .and_then(|p| find_project(&projects, p).ok().flatten())
                .map(|p| p.slug())
                .unwrap_or_else(|| "tasks".to_string());
            let parameters = to_list_parameters(filters, &projects);
            let exporter = format.exporter();
            let text =
                export_tasks(&tasks, exporter.as_ref(), &parameters).unwrap_or_else(|e| fail(e));

            match output {
                None => println!("{}", text),
                Some(path) => {
                    let path = if path.is_dir() {
                        path.join(format!("{}{}", file_stem, exporter.file_extension()))
                    } else if path.extension().is_none() {
                        path.with_extension(exporter.file_extension().trim_start_matches('.'))
                    } else {
                        path
                    };
                    std::fs::write(&path, text).unwrap_or_else(|e| fail(e));
                    println!("{} Exported to {}", "✓".green(), path.display());
                }
            }
        }
        Some(Commands::Remind) => {
            let mut notifier = config.notifier().unwrap_or_else(|e| fail(e));
            let reminded = remind_overdue(&tasks, &mut *notifier).unwrap_or_else(|e| fail(e));
            if reminded.is_empty() {
                println!("Nothing is overdue");
            }
        }
        Some(Commands::Project(ProjectCommands::New {
            name,
            description,
            id,
        })) => {
            let project = create_project(
                &mut projects,
                CreateProjectParameters {
                    id,
                    name,
                    description,
                },
            )
            .unwrap_or_else(|e| fail(e));
            println!(
                "{} Created project {} ({})",
                "✓".green(),
                project.name().bold(),
                project.id().dimmed()
            );
        }
        Some(Commands::Project(ProjectCommands::Delete { id_or_slug })) => {
            let result = delete_project(
                &mut projects,
                &mut tasks,
                DeleteProjectParameters { id_or_slug },
            )
            .unwrap_or_else(|e| fail(e));
            println!(
                "{} Deleted project {} and {} {}",
                "✗".red(),
                result.project.name().bold(),
                result.cascaded_tasks_count,
                if result.cascaded_tasks_count == 1 { "task" } else { "tasks" }
            );
        }
        Some(Commands::Project(ProjectCommands::List)) => {
            let mut all = projects.find_all().unwrap_or_else(|e| fail(e));
            if all.is_empty() {
                println!("No projects");
                return;
            }
            all.sort_by(|a, b| a.name().to_lowercase().cmp(&b.name().to_lowercase()));

            println!(
                "{} ({} {})\n",
                "PROJECTS".cyan(),
                all.len(),
                if all.len() == 1 { "project" } else { "projects" }
            );
            for project in all {
                let task_count = tasks
                    .find_by_project_id(project.id())
                    .unwrap_or_else(|e| fail(e))
                    .len();

                println!("{} {} {}", "•".green(), project.name().bold(), project.id().dimmed());
                if !project.description().is_empty() {
                    println!("    {}", project.description());
                }
                println!(
                    "    {} {}  ·  {} {}",
                    task_count.to_string().dimmed(),
                    if task_count == 1 { "task" } else { "tasks" }.dimmed(),
                    "created".dimmed(),
                    ui::format_timestamp(project.created_at()).dimmed()
                );
                println!("    {}", "─".repeat(30).dimmed());
                println!();
            }
        }
        Some(Commands::Project(ProjectCommands::View { id_or_slug })) => {
            let (project, owned) =
                project_tasks(&projects, &tasks, &id_or_slug).unwrap_or_else(|e| fail(e));
            if owned.is_empty() {
                println!("No tasks in project '{}'", project.name());
            } else {
                ui::render_view_header(project.name(), owned.len());
                for task in &owned {
                    ui::render_task_line(task, None);
                }
            }
        }
        None => {
            // Default: open tasks, overdue first
            let open: Vec<Task> = tasks
                .find_all()
                .unwrap_or_else(|e| fail(e))
                .into_iter()
                .filter(|t| !t.is_done())
                .collect();
            if open.is_empty() {
                println!("Nothing to do");
                return;
            }

            let names = project_names(&projects);
            let (mut overdue, mut upcoming): (Vec<Task>, Vec<Task>) =
                open.into_iter().partition(|t| t.is_overdue());
            overdue.sort_by_key(|t| t.due_date());
            upcoming.sort_by_key(|t| (t.due_date().is_none(), t.due_date(), t.created_at()));

            ui::render_view_header("Open", overdue.len() + upcoming.len());
            if !overdue.is_empty() {
                ui::render_section_header("Overdue");
                for task in &overdue {
                    ui::render_task_line(task, names.get(task.project_id()));
                }
                ui::render_section_header("Upcoming");
            }
            for task in &upcoming {
                ui::render_task_line(task, names.get(task.project_id()));
            }
        }
    }
}
