use server_api::FormSubmissionHandler;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) contact: FormSubmissionHandler,
}
