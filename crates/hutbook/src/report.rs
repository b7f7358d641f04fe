use hutbook_engine::schedule::RequestReport;
use std::fmt::Write;
use std::process::ExitCode;

/// One line per request: `label: Disposition after N attempt(s) (reason)`.
pub fn render(reports: &[RequestReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let d = &report.disposition;
        let plural = if d.attempts() == 1 { "" } else { "s" };
        let _ = writeln!(
            out,
            "{}: {} after {} attempt{} ({})",
            report.label,
            d.name(),
            d.attempts(),
            plural,
            d.reason()
        );
    }
    out
}

pub fn exit_code(reports: &[RequestReport]) -> ExitCode {
    if reports.iter().all(|r| r.disposition.is_success()) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hutbook_engine::schedule::Disposition;

    fn report(label: &str, disposition: Disposition) -> RequestReport {
        RequestReport {
            label: label.into(),
            disposition,
        }
    }

    #[test]
    fn renders_one_line_per_request() {
        let reports = vec![
            report("margherita", Disposition::DryRunStopped { attempts: 1 }),
            report(
                "gnifetti",
                Disposition::Exhausted {
                    attempts: 4,
                    reason: "hut is full".into(),
                },
            ),
        ];
        assert_eq!(
            render(&reports),
            "margherita: DryRunStopped after 1 attempt (dry run stopped before submit)\n\
             gnifetti: Exhausted after 4 attempts (hut is full)\n"
        );
    }

    #[test]
    fn any_unsuccessful_request_fails_the_run() {
        let ok = vec![
            report("a", Disposition::Completed { attempts: 1 }),
            report("b", Disposition::AwaitingConfirmation { attempts: 3 }),
        ];
        assert_eq!(exit_code(&ok), ExitCode::SUCCESS);

        let mut failed = ok;
        failed.push(report(
            "c",
            Disposition::Fatal {
                attempts: 1,
                reason: "ambiguous hut".into(),
            },
        ));
        assert_eq!(exit_code(&failed), ExitCode::FAILURE);
    }
}
