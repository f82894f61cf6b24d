pub trait Work: FnOnce() + Send + 'static {}
impl<F: FnOnce() + Send + 'static> Work for F {}

pub trait AsyncWork: Future<Output = ()> + Send + 'static {}
impl<F: Future<Output = ()> + Send + 'static> AsyncWork for F {}
