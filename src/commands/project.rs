//! Portfolio project commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use mediastore_core::error::AppError;
use mediastore_entity::{Project, ProjectPatch};
use mediastore_service::ServiceContext;

use crate::output::{self, OutputFormat};

/// Arguments for project commands
#[derive(Debug, Args)]
pub struct ProjectArgs {
    /// Project subcommand
    #[command(subcommand)]
    pub command: ProjectCommand,
}

/// Project subcommands
#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// List projects in display order
    List {
        /// Bypass the cache
        #[arg(long)]
        force: bool,
    },
    /// Create a project
    Add {
        /// Title
        title: String,
        /// URL slug
        #[arg(short, long)]
        slug: String,
        /// Short summary
        #[arg(long)]
        summary: Option<String>,
        /// Display position
        #[arg(long, default_value = "0")]
        order: i64,
    },
    /// Change a project's fields
    Edit {
        /// Project ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New summary
        #[arg(long)]
        summary: Option<String>,
        /// Publish or unpublish
        #[arg(long)]
        published: Option<bool>,
        /// New display position
        #[arg(long)]
        order: Option<i64>,
    },
    /// Delete a project
    Rm {
        /// Project ID
        id: String,
    },
}

/// Project display row
#[derive(Debug, Serialize, Tabled)]
struct ProjectRow {
    /// Project ID
    id: String,
    /// Title
    title: String,
    /// Slug
    slug: String,
    /// Published
    published: bool,
    /// Display position
    order: i64,
}

impl From<&Project> for ProjectRow {
    fn from(p: &Project) -> Self {
        Self {
            id: p.id.to_string(),
            title: p.title.clone(),
            slug: p.slug.clone(),
            published: p.published,
            order: p.sort_order,
        }
    }
}

/// Execute project commands
pub async fn execute(
    args: &ProjectArgs,
    ctx: &ServiceContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    let projects = &ctx.projects;

    match &args.command {
        ProjectCommand::List { force } => {
            let rows: Vec<ProjectRow> = projects
                .get_all(*force)
                .await?
                .iter()
                .map(ProjectRow::from)
                .collect();
            output::print_list(&rows, format);
        }
        ProjectCommand::Add {
            title,
            slug,
            summary,
            order,
        } => {
            let mut project = Project::new(title, slug);
            project.summary = summary.clone();
            project.sort_order = *order;
            projects.save(&project).await?;
            output::print_success(&format!("Project '{}' created (id: {})", project.title, project.id));
        }
        ProjectCommand::Edit {
            id,
            title,
            summary,
            published,
            order,
        } => {
            let patch = ProjectPatch {
                title: title.clone(),
                summary: summary.clone().map(Some),
                published: *published,
                sort_order: *order,
                ..ProjectPatch::new()
            };
            let project = projects.update(id, patch).await?;
            output::print_success(&format!("Project '{}' updated", project.title));
        }
        ProjectCommand::Rm { id } => {
            projects.delete(id).await?;
            output::print_success(&format!("Project {id} deleted"));
        }
    }

    Ok(())
}
