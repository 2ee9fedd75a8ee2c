/// A message on the bus: a subject and a marshalled JSON body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    /// What the message is about; receivers dispatch on it.
    pub subject: String,
    /// The marshalled JSON body.
    pub body: String,
}

impl Payload {
    /// Creates a payload.
    #[inline]
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}
