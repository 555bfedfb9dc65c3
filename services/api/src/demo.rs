use crate::infra::{build_service, load_repository, ProgramService};
use clap::{Args, ValueEnum};
use mentorship::config::AppConfig;
use mentorship::error::AppError;
use mentorship::workflows::cohorts::{
    ActorId, ApprovalRequest, ApprovalState, Cohort, Entrepreneurship, EntrepreneurshipId,
    EvaluationKind, EvaluationRecord, InMemoryCohortRepository, ProgramSettings, ProgramSnapshot,
    RankingEntry, RejectionRequest, SubmissionState, Tier,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub(crate) enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

#[derive(Args, Debug)]
pub(crate) struct RankingArgs {
    /// JSON program snapshot
    #[arg(long)]
    pub(crate) seed: PathBuf,
    /// Number of entries to print (defaults to PROGRAM_RANKING_SIZE)
    #[arg(long)]
    pub(crate) limit: Option<usize>,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// JSON program snapshot
    #[arg(long)]
    pub(crate) seed: PathBuf,
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub(crate) format: ExportFormat,
    /// Tier tab to export as CSV; without it the CSV holds the ranking
    #[arg(long)]
    pub(crate) tier: Option<Tier>,
    /// Destination file
    #[arg(long)]
    pub(crate) output: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Scale-level ventures to generate; one more than the Scale ceiling shows a refusal
    #[arg(long, default_value_t = 46)]
    pub(crate) scale_ventures: usize,
}

fn program_settings(limit: Option<usize>) -> Result<ProgramSettings, AppError> {
    let mut settings = AppConfig::load()?.program;
    if let Some(limit) = limit {
        settings.ranking_size = limit;
    }
    Ok(settings)
}

pub(crate) fn run_ranking(args: RankingArgs) -> Result<(), AppError> {
    let settings = program_settings(args.limit)?;
    let repository = load_repository(Some(&args.seed))?;
    let service = build_service(repository, settings);

    let ranking = service.ranking()?;
    println!("Ranking (top {})", settings.ranking_size);
    render_ranking(&ranking);
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let ExportArgs {
        seed,
        format,
        tier,
        output,
    } = args;

    let repository = load_repository(Some(&seed))?;
    let service = build_service(repository, program_settings(None)?);

    let bytes = match (format, tier) {
        (ExportFormat::Csv, Some(tier)) => service.export_tier_csv(tier)?,
        (ExportFormat::Csv, None) => service.export_ranking_csv()?,
        (ExportFormat::Xlsx, _) => service.export_workbook()?,
    };
    std::fs::write(&output, &bytes)?;
    println!("Wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let snapshot = synthetic_program(args.scale_ventures);
    let service = build_service(
        InMemoryCohortRepository::from_snapshot(snapshot),
        ProgramSettings::default(),
    );
    let admin = ActorId("demo-admin".to_string());

    println!("Mentorship cohort demo");
    render_usage(&service)?;

    println!("\nSeating Scale ventures");
    let scale: Vec<EntrepreneurshipId> = (0..args.scale_ventures).map(scale_id).collect();
    let mut refused = None;
    for id in &scale {
        let request = ApprovalRequest {
            entrepreneurship_id: id.clone(),
            tier: Tier::Scale,
            cohort: None,
            actor_id: admin.clone(),
        };
        if let Err(err) = service.approve(request) {
            println!("- {id} refused: {err}");
            refused = Some(id.clone());
            break;
        }
    }

    println!("\nSeating Growth and Starter ventures");
    for (index, (tier, cohort)) in [
        (Tier::Growth, Cohort::First),
        (Tier::Growth, Cohort::Second),
        (Tier::Starter, Cohort::First),
        (Tier::Starter, Cohort::Second),
    ]
    .into_iter()
    .enumerate()
    {
        let id = level_id(tier, index);
        let request = ApprovalRequest {
            entrepreneurship_id: id.clone(),
            tier,
            cohort: Some(cohort),
            actor_id: admin.clone(),
        };
        match service.approve(request) {
            Ok(row) => println!(
                "- {} approved into {} cohort {}",
                row.entrepreneurship_id, row.tier, cohort
            ),
            Err(err) => println!("- {id} refused: {err}"),
        }
    }

    if let (Some(waiting), Some(seated)) = (refused, scale.first()) {
        println!("\nFreeing a Scale seat");
        service.reject(RejectionRequest {
            entrepreneurship_id: seated.clone(),
            tier: Tier::Scale,
            actor_id: admin.clone(),
        })?;
        println!("- {seated} rejected");
        service.approve(ApprovalRequest {
            entrepreneurship_id: waiting.clone(),
            tier: Tier::Scale,
            cohort: None,
            actor_id: admin,
        })?;
        println!("- {waiting} approved into the freed seat");
    }

    println!();
    render_usage(&service)?;

    println!("\nRanking (top 5)");
    let ranking = service.ranking()?;
    render_ranking(&ranking[..ranking.len().min(5)]);

    let progress = service.progress()?;
    let summary = progress.summary;
    println!("\nEvaluation progress");
    println!(
        "- {} ventures | {} not evaluated | {} automatic only | {} in review | {} reviewed",
        summary.entrepreneurships,
        summary.not_evaluated,
        summary.automatic_only,
        summary.in_review,
        summary.reviewed
    );
    if let Some(mean) = summary.mean_score {
        println!("- mean aggregated score {mean:.2}");
    }
    Ok(())
}

fn render_usage(service: &ProgramService) -> Result<(), AppError> {
    println!("Seat usage");
    for tier in Tier::ALL {
        let usage = service.tier_overview(tier)?.usage;
        let cohorts: Vec<String> = usage
            .cohorts
            .iter()
            .map(|cohort| {
                format!(
                    "cohort {} {}/{}",
                    cohort.cohort, cohort.approved, cohort.ceiling
                )
            })
            .collect();
        let detail = if cohorts.is_empty() {
            String::new()
        } else {
            format!(" ({})", cohorts.join(", "))
        };
        println!(
            "- {}: {}/{} approved{}",
            tier.title(),
            usage.approved,
            usage.ceiling,
            detail
        );
    }
    Ok(())
}

fn render_ranking(entries: &[RankingEntry]) {
    if entries.is_empty() {
        println!("  (no evaluated ventures)");
        return;
    }
    for entry in entries {
        println!(
            "{:>4}. {:>6.2}  {} ({}) [{} evaluations]",
            entry.position, entry.score, entry.name, entry.owner_name, entry.evaluations
        );
    }
}

const VENTURE_NAMES: [&str; 8] = [
    "Huerta Viva",
    "CodeLab",
    "Tejidos del Sur",
    "Solar Rural",
    "Café Origen",
    "Reciclarte",
    "Ruta Andina",
    "Panadería Luna",
];

fn scale_id(index: usize) -> EntrepreneurshipId {
    EntrepreneurshipId(format!("scale-{index:03}"))
}

fn level_id(tier: Tier, index: usize) -> EntrepreneurshipId {
    EntrepreneurshipId(format!("{}-{index:03}", tier.label()))
}

fn synthetic_venture(id: EntrepreneurshipId, index: usize) -> Entrepreneurship {
    let name = VENTURE_NAMES[index % VENTURE_NAMES.len()];
    Entrepreneurship {
        name: format!("{name} {index}"),
        owner_id: ActorId(format!("owner-{}", id.0)),
        owner_name: format!("Owner {index}"),
        tier: None,
        id,
    }
}

fn evaluation(
    id: &EntrepreneurshipId,
    score: Option<f64>,
    kind: EvaluationKind,
    submission: SubmissionState,
    approval: ApprovalState,
) -> EvaluationRecord {
    EvaluationRecord {
        entrepreneurship_id: id.clone(),
        score,
        kind,
        submission,
        approval,
        reviewer_id: (kind == EvaluationKind::Reviewer)
            .then(|| ActorId("demo-reviewer".to_string())),
    }
}

/// Deterministic program with `scale` Scale-level ventures plus a few in each lower
/// tier and some that have only draft reviews.
pub(crate) fn synthetic_program(scale: usize) -> ProgramSnapshot {
    let mut snapshot = ProgramSnapshot::default();

    let mut push_scored = |id: EntrepreneurshipId, index: usize, automatic: f64, reviewer: f64| {
        snapshot.evaluations.push(evaluation(
            &id,
            Some(automatic),
            EvaluationKind::Automatic,
            SubmissionState::Submitted,
            ApprovalState::Pending,
        ));
        snapshot.evaluations.push(evaluation(
            &id,
            Some(reviewer),
            EvaluationKind::Reviewer,
            SubmissionState::Submitted,
            ApprovalState::Approved,
        ));
        snapshot
            .entrepreneurships
            .push(synthetic_venture(id, index));
    };

    for index in 0..scale {
        let spread = (index * 37 % 29) as f64;
        push_scored(scale_id(index), index, 71.0 + spread, 72.0 + spread / 2.0);
    }
    for index in 0..4 {
        let spread = (index * 5) as f64;
        push_scored(level_id(Tier::Growth, index), scale + index, 45.0 + spread, 50.0 + spread);
        push_scored(
            level_id(Tier::Starter, index),
            scale + 4 + index,
            20.0 + spread,
            25.0 + spread,
        );
    }

    for index in 0..3 {
        let id = EntrepreneurshipId(format!("draft-{index:03}"));
        snapshot.evaluations.push(evaluation(
            &id,
            Some(90.0),
            EvaluationKind::Reviewer,
            SubmissionState::Draft,
            ApprovalState::Pending,
        ));
        snapshot
            .entrepreneurships
            .push(synthetic_venture(id, scale + 8 + index));
    }

    snapshot
}
